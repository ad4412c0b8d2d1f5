// Minimal run to verify the core functionality works

use std::sync::Arc;

use effect_assets::{
    assets::{parser, AssetOrigin, AssetRegistry, AssetSources, ServiceMetadata, StaticCatalog},
    config::Profile,
    keyframes::{KeyframeModelList, ParamValue},
    params::{KeyframeBinder, ParamSchema},
};

const FADE: &str = r#"<effect tag="brightness" id="fade_from_black">
  <name>Fade from Black</name>
  <parameter type="animated" name="level" default="1" min="0" max="1" decimals="2"/>
</effect>"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🎬 Testing Effect-Assets Core Functionality");

    // Test 1: Registry
    println!("\n1. Testing Asset Registry...");
    let catalog = StaticCatalog::from_services([
        ServiceMetadata::new("brightness").with_title("Brightness"),
        ServiceMetadata::new("volume").with_title("Volume").with_tag("Audio"),
    ]);
    let sources = AssetSources {
        bundled_dirs: vec!["data/effects".into()],
        ..AssetSources::default()
    };
    let mut registry = AssetRegistry::new(Arc::new(catalog), sources);
    let summary = registry.initialize();
    println!("   Registered {} assets ({} from files)", registry.len(), summary.files_loaded);
    assert!(registry.exists("volume"));

    // Test 2: Definition parsing
    println!("\n2. Testing Definition Parsing...");
    let outcomes = parser::parse_definition(FADE, AssetOrigin::Builtin, &StaticCatalog::new())?;
    let fade = outcomes
        .iter()
        .find_map(|o| o.asset())
        .ok_or("fade definition not parsed")?;
    println!("   {} -> {} ({})", fade.id, fade.service, fade.kind);

    // Test 3: Keyframes
    println!("\n3. Testing Keyframe Model...");
    let schema = ParamSchema::from_asset(fade, &Profile::default());
    let mut model = KeyframeModelList::new(schema, 50);
    model.add_or_update_keyframe(0, ParamValue::Scalar(0.0), 0)?;
    model.add_or_update_keyframe(50, ParamValue::Scalar(1.0), 0)?;
    let mid = model.interpolated_value(25, 0)?;
    println!("   Value at frame 25: {}", mid);
    assert_eq!(mid, ParamValue::Scalar(0.5));

    // Test 4: Binding
    println!("\n4. Testing Parameter Binding...");
    let mut binder = KeyframeBinder::new(&model);
    let report = binder.set_position(&model, 50);
    println!("   At keyframe: {}", report.at_keyframe());
    binder.toggle_keyframe(&mut model, 0)?;
    println!("   Animation after toggle: {:?}", model.animation_string(0));

    println!("\n🎉 All checks passed! Effect-Assets core is working.");

    Ok(())
}
