use tracing::{debug, warn};

use crate::{
    assets::{AssetInfo, XmlElement},
    config::Profile,
    keyframes::{ParamValue, Rect, ValueKind},
};

/// Parameter types understood by the effects core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Constant number
    Double,
    /// Keyframable number
    Keyframe,
    /// Keyframable rectangle
    AnimatedRect,
    Bool,
    List,
    /// Value the user cannot change
    Fixed,
}

impl ParamType {
    pub fn from_type_attr(value: &str) -> Option<Self> {
        match value {
            "constant" | "double" => Some(Self::Double),
            "animated" | "keyframe" | "simplekeyframe" => Some(Self::Keyframe),
            "animatedrect" | "geometry" => Some(Self::AnimatedRect),
            "bool" => Some(Self::Bool),
            "list" => Some(Self::List),
            "fixed" => Some(Self::Fixed),
            _ => None,
        }
    }

    pub fn is_keyframable(&self) -> bool {
        matches!(self, Self::Keyframe | Self::AnimatedRect)
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            Self::AnimatedRect => ValueKind::Rect,
            _ => ValueKind::Scalar,
        }
    }
}

/// One parameter of an effect, as declared in its definition
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDef {
    /// Engine property name
    pub name: String,
    pub display_name: String,
    pub kind: ParamType,
    pub default: ParamValue,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub decimals: usize,
    pub factor: f64,
    pub suffix: String,
    pub comment: Option<String>,
    /// Initial animation string carried by the definition (`value` attribute)
    pub animation: Option<String>,
}

impl ParamDef {
    /// Validate one `<parameter>` element. Returns `None` (and logs why) for
    /// parameters the core cannot represent.
    pub fn from_element(element: &XmlElement, profile: &Profile) -> Option<Self> {
        let Some(name) = element.non_empty_attr("name") else {
            warn!("Ignoring parameter without a name");
            return None;
        };

        let type_attr = element.attr("type").unwrap_or("constant");
        let Some(kind) = ParamType::from_type_attr(type_attr) else {
            debug!("Ignoring parameter {} of unsupported type {}", name, type_attr);
            return None;
        };

        let number = |key: &str| element.attr(key).and_then(|v| v.trim().parse::<f64>().ok());

        let default = match kind {
            ParamType::AnimatedRect => {
                let text = element.attr("default").unwrap_or("0 0 %width %height");
                match Rect::parse_in_frame(text, Some(profile.frame_size())) {
                    Ok(rect) => ParamValue::Rect(rect),
                    Err(e) => {
                        warn!("Parameter {} has an invalid default: {}", name, e);
                        ParamValue::Rect(Rect::new(
                            0.0,
                            0.0,
                            f64::from(profile.width),
                            f64::from(profile.height),
                        ))
                    }
                }
            }
            _ => ParamValue::Scalar(number("default").unwrap_or(0.0)),
        };

        let animation = element
            .non_empty_attr("value")
            .filter(|v| kind.is_keyframable() && v.contains('='))
            .map(str::to_string);

        Some(Self {
            name: name.to_string(),
            display_name: element.child_text("name").unwrap_or(name).to_string(),
            kind,
            default,
            min: number("min"),
            max: number("max"),
            decimals: element
                .attr("decimals")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0),
            factor: number("factor").filter(|f| *f != 0.0).unwrap_or(1.0),
            suffix: element.attr("suffix").unwrap_or_default().to_string(),
            comment: element.child_text("comment").map(str::to_string),
            animation,
        })
    }

    /// Restrict a scalar to the declared `[min, max]` range. Rectangles and
    /// unbounded parameters pass through.
    pub fn clamp(&self, value: ParamValue) -> ParamValue {
        match value {
            ParamValue::Scalar(mut v) => {
                if let Some(min) = self.min {
                    v = v.max(min);
                }
                if let Some(max) = self.max {
                    v = v.min(max);
                }
                ParamValue::Scalar(v)
            }
            ParamValue::Rect(_) => value,
        }
    }

    /// Format a value the way a parameter control shows it (scaled by `factor`)
    pub fn format_value(&self, value: &ParamValue) -> String {
        match value {
            ParamValue::Scalar(v) => {
                let text = format!("{:.*}", self.decimals, v * self.factor);
                if self.suffix.is_empty() {
                    text
                } else {
                    format!("{} {}", text, self.suffix)
                }
            }
            ParamValue::Rect(r) => r.to_string(),
        }
    }
}

/// Ordered parameter list of one effect
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSchema {
    params: Vec<ParamDef>,
}

impl ParamSchema {
    pub fn new(params: Vec<ParamDef>) -> Self {
        Self { params }
    }

    /// Collect every `<parameter>` of an asset definition, including those
    /// nested in the members of an effect group
    pub fn from_asset(asset: &AssetInfo, profile: &Profile) -> Self {
        let params: Vec<ParamDef> = asset
            .xml
            .descendants_named("parameter")
            .into_iter()
            .filter_map(|el| ParamDef::from_element(el, profile))
            .collect();

        debug!("Effect {} exposes {} parameters", asset.id, params.len());
        Self { params }
    }

    pub fn get(&self, index: usize) -> Option<&ParamDef> {
        self.params.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParamDef> {
        self.params.iter()
    }

    /// Indices of parameters that can carry keyframes
    pub fn keyframable(&self) -> Vec<usize> {
        self.params
            .iter()
            .enumerate()
            .filter(|(_, p)| p.kind.is_keyframable())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetKind, AssetOrigin};

    fn asset(xml: &str) -> AssetInfo {
        let xml = XmlElement::parse(xml).unwrap();
        AssetInfo {
            id: "test".into(),
            service: "test".into(),
            display_name: "Test".into(),
            description: None,
            kind: AssetKind::Video,
            xml,
            origin: AssetOrigin::Builtin,
        }
    }

    #[test]
    fn test_schema_from_definition() {
        let info = asset(
            r#"<effect tag="affine">
                 <parameter type="animated" name="opacity" default="1" min="0" max="1" decimals="2" suffix="%">
                   <name>Opacity</name>
                   <comment>Layer opacity</comment>
                 </parameter>
                 <parameter type="animatedrect" name="rect" default="0 0 %width %height"/>
                 <parameter type="bool" name="invert" default="1"/>
                 <parameter type="wavelet" name="exotic"/>
                 <parameter type="constant"/>
               </effect>"#,
        );
        let schema = ParamSchema::from_asset(&info, &Profile::default());

        assert_eq!(schema.len(), 3);
        assert_eq!(schema.keyframable(), vec![0, 1]);

        let opacity = schema.get(0).unwrap();
        assert_eq!(opacity.display_name, "Opacity");
        assert_eq!(opacity.default, ParamValue::Scalar(1.0));
        assert_eq!(opacity.min, Some(0.0));
        assert_eq!(opacity.decimals, 2);
        assert_eq!(opacity.comment.as_deref(), Some("Layer opacity"));
        assert_eq!(opacity.format_value(&ParamValue::Scalar(0.5)), "0.50 %");

        let rect = schema.get(schema.index_of("rect").unwrap()).unwrap();
        assert_eq!(rect.kind, ParamType::AnimatedRect);
        assert_eq!(rect.default, ParamValue::Rect(Rect::new(0.0, 0.0, 1920.0, 1080.0)));

        assert_eq!(schema.get(2).unwrap().kind, ParamType::Bool);
    }

    #[test]
    fn test_clamp_and_factor() {
        let info = asset(
            r#"<effect tag="volume">
                 <parameter type="animated" name="level" default="0.5" min="0" max="1" factor="100" suffix="%"/>
                 <parameter type="animated" name="free" default="0"/>
               </effect>"#,
        );
        let schema = ParamSchema::from_asset(&info, &Profile::default());
        let level = schema.get(0).unwrap();

        assert_eq!(level.clamp(ParamValue::Scalar(7.0)), ParamValue::Scalar(1.0));
        assert_eq!(level.clamp(ParamValue::Scalar(-2.0)), ParamValue::Scalar(0.0));
        assert_eq!(level.clamp(ParamValue::Scalar(0.25)), ParamValue::Scalar(0.25));
        assert_eq!(level.format_value(&ParamValue::Scalar(0.5)), "50 %");

        let free = schema.get(1).unwrap();
        assert_eq!(free.clamp(ParamValue::Scalar(-1e9)), ParamValue::Scalar(-1e9));
    }

    #[test]
    fn test_initial_animation_only_for_keyframable() {
        let info = asset(
            r#"<effect tag="fade">
                 <parameter type="animated" name="level" value="0=0;25=1"/>
                 <parameter type="constant" name="gain" value="0=3"/>
               </effect>"#,
        );
        let schema = ParamSchema::from_asset(&info, &Profile::default());
        assert_eq!(schema.get(0).unwrap().animation.as_deref(), Some("0=0;25=1"));
        assert_eq!(schema.get(1).unwrap().animation, None);
    }

    #[test]
    fn test_group_members_contribute_parameters() {
        let info = asset(
            r#"<effectgroup tag="look">
                 <effect tag="a"><parameter type="animated" name="x"/></effect>
                 <effect tag="b"><parameter type="animated" name="y"/></effect>
               </effectgroup>"#,
        );
        let schema = ParamSchema::from_asset(&info, &Profile::default());
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.index_of("y"), Some(1));
    }
}
