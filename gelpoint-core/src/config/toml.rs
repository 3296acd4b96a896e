//! Recipe text parser
//!
//! A minimal line-oriented parser for the TOML subset recipes are written
//! in. It does NOT support the full TOML spec.
//!
//! Supported features:
//! - `[recipe]`, `[material]`, `[profile]` tables
//! - `[[segment]]` array-of-tables, one per segment, in execution order
//! - Key = value pairs (string, float, integer, boolean)
//! - Underscore digit separators (`66_500`)
//! - Comments (# ...)
//!
//! NOT supported:
//! - Inline tables and arrays
//! - Multi-line strings
//! - Dotted keys

use heapless::String as HString;

use super::{
    ConfigError, MaterialProperties, ProcessProfile, SafetyLimits, Segment, MAX_LABEL_LEN,
};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed table header
    InvalidSection,
    /// Key/value line outside any table
    KeyOutsideSection,
    /// Key not valid in the current table
    UnknownKey,
    /// Value could not be parsed as the expected type
    InvalidValue,
    /// Required segment key missing
    MissingKey,
    /// Too many segments, or a string too long
    TooManyItems,
    /// Line is neither a header nor `key = value`
    Malformed,
}

/// A parsed recipe: the profile to run and the material it cures
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub profile: ProcessProfile,
    pub material: MaterialProperties,
}

impl Recipe {
    /// Validate both halves of the recipe
    pub fn validate(&self, limits: &SafetyLimits) -> Result<(), ConfigError> {
        self.material.validate()?;
        self.profile.validate(limits)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Recipe,
    Material,
    Profile,
    Segment,
}

/// Segment under construction; required keys are checked when it closes
#[derive(Debug, Default)]
struct SegmentBuilder {
    target_temp: Option<f32>,
    duration_s: Option<u32>,
    heating_rate: Option<f32>,
    vacuum_target: f32,
    pressure_target: f32,
}

impl SegmentBuilder {
    fn finish(self) -> Result<Segment, ParseError> {
        Ok(Segment {
            target_temp: self.target_temp.ok_or(ParseError::MissingKey)?,
            duration_s: self.duration_s.ok_or(ParseError::MissingKey)?,
            heating_rate: self.heating_rate.ok_or(ParseError::MissingKey)?,
            vacuum_target: self.vacuum_target,
            pressure_target: self.pressure_target,
        })
    }
}

/// Parse recipe text
///
/// The result is syntactically complete but not yet checked against the
/// safety limits; call [`ProcessProfile::validate`] and
/// [`MaterialProperties::validate`] before running it.
pub fn parse_recipe(input: &str) -> Result<Recipe, ParseError> {
    let mut recipe = Recipe {
        profile: ProcessProfile::default(),
        material: MaterialProperties::default(),
    };
    let mut section = Section::Root;
    let mut current_segment: Option<SegmentBuilder> = None;

    for line in input.lines() {
        let line = strip_comment(line).trim();

        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') {
            close_segment(&mut recipe, &mut current_segment)?;
            section = parse_section_header(line)?;
            if section == Section::Segment {
                current_segment = Some(SegmentBuilder::default());
            }
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::Malformed)?;
        match section {
            Section::Root => return Err(ParseError::KeyOutsideSection),
            Section::Recipe => apply_recipe(&mut recipe.profile, key, value)?,
            Section::Material => apply_material(&mut recipe.material, key, value)?,
            Section::Profile => apply_profile(&mut recipe.profile, key, value)?,
            Section::Segment => {
                if let Some(builder) = current_segment.as_mut() {
                    apply_segment(builder, key, value)?;
                }
            }
        }
    }

    close_segment(&mut recipe, &mut current_segment)?;

    Ok(recipe)
}

fn close_segment(
    recipe: &mut Recipe,
    current: &mut Option<SegmentBuilder>,
) -> Result<(), ParseError> {
    if let Some(builder) = current.take() {
        recipe
            .profile
            .segments
            .push(builder.finish()?)
            .map_err(|_| ParseError::TooManyItems)?;
    }
    Ok(())
}

fn parse_section_header(line: &str) -> Result<Section, ParseError> {
    if let Some(inner) = line.strip_prefix("[[").and_then(|l| l.strip_suffix("]]")) {
        return match inner.trim() {
            "segment" => Ok(Section::Segment),
            _ => Err(ParseError::InvalidSection),
        };
    }

    let inner = line
        .strip_prefix('[')
        .and_then(|l| l.strip_suffix(']'))
        .ok_or(ParseError::InvalidSection)?;

    match inner.trim() {
        "recipe" => Ok(Section::Recipe),
        "material" => Ok(Section::Material),
        "profile" => Ok(Section::Profile),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Drop a trailing comment unless the `#` sits inside a string
/// Cut at the first `#` outside a quoted string
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (pos, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..pos],
            _ => {}
        }
    }
    line
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

fn parse_string(value: &str) -> Result<&str, ParseError> {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or(ParseError::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Copy a numeric literal without its `_` separators
fn without_separators(value: &str) -> Result<HString<32>, ParseError> {
    let mut out = HString::new();
    for c in value.chars().filter(|c| *c != '_') {
        out.push(c).map_err(|_| ParseError::InvalidValue)?;
    }
    Ok(out)
}

fn parse_number<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    without_separators(value)?
        .parse()
        .map_err(|_| ParseError::InvalidValue)
}

fn parse_f32(value: &str) -> Result<f32, ParseError> {
    let v: f32 = parse_number(value)?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ParseError::InvalidValue)
    }
}

fn parse_f64(value: &str) -> Result<f64, ParseError> {
    let v: f64 = parse_number(value)?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ParseError::InvalidValue)
    }
}

fn apply_recipe(profile: &mut ProcessProfile, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "name" => {
            profile.name = HString::<MAX_LABEL_LEN>::try_from(parse_string(value)?)
                .map_err(|_| ParseError::TooManyItems)?;
        }
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

fn apply_profile(profile: &mut ProcessProfile, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "auto_exotherm_control" => profile.auto_exotherm_control = parse_bool(value)?,
        "max_exotherm_temp" => profile.max_exotherm_temp = parse_f32(value)?,
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

/// Apply a material key
///
/// `preset` replaces every constant, so it belongs first in the table.
fn apply_material(
    material: &mut MaterialProperties,
    key: &str,
    value: &str,
) -> Result<(), ParseError> {
    match key {
        "preset" => {
            *material = match parse_string(value)? {
                "toughened_epoxy" => MaterialProperties::toughened_epoxy(),
                "tooling_epoxy" => MaterialProperties::tooling_epoxy(),
                _ => return Err(ParseError::InvalidValue),
            };
        }
        "pre_exponential" => material.pre_exponential = parse_f64(value)?,
        "activation_energy" => material.activation_energy = parse_f64(value)?,
        "order_m" => material.order_m = parse_f64(value)?,
        "order_n" => material.order_n = parse_f64(value)?,
        "tg_uncured" => material.tg_uncured = parse_f64(value)?,
        "tg_cured" => material.tg_cured = parse_f64(value)?,
        "dibenedetto_lambda" => material.dibenedetto_lambda = parse_f64(value)?,
        "viscosity_inf" => material.viscosity_inf = parse_f64(value)?,
        "viscosity_activation" => material.viscosity_activation = parse_f64(value)?,
        "alpha_gel" => material.alpha_gel = parse_f64(value)?,
        "viscosity_exponent" => material.viscosity_exponent = parse_f64(value)?,
        "initial_cure" => material.initial_cure = parse_f64(value)?,
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

fn apply_segment(builder: &mut SegmentBuilder, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "target_temp" => builder.target_temp = Some(parse_f32(value)?),
        "heating_rate" => builder.heating_rate = Some(parse_f32(value)?),
        "duration_s" => builder.duration_s = Some(parse_number(value)?),
        "duration_min" => {
            let minutes: u32 = parse_number(value)?;
            builder.duration_s = Some(
                minutes
                    .checked_mul(60)
                    .ok_or(ParseError::InvalidValue)?,
            );
        }
        "vacuum_target" => builder.vacuum_target = parse_f32(value)?,
        "pressure_target" => builder.pressure_target = parse_f32(value)?,
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECIPE: &str = r#"
# Standard 177 °C cure
[recipe]
name = "BMS 8-276 cure"

[material]
preset = "toughened_epoxy"
activation_energy = 66_500.0   # J/mol

[profile]
auto_exotherm_control = true
max_exotherm_temp = 190

[[segment]]
target_temp = 121.0
duration_min = 30
heating_rate = 2.0
vacuum_target = 740

[[segment]]
target_temp = 177.0
duration_min = 120
heating_rate = 1.5
vacuum_target = 740
pressure_target = 85.0
"#;

    #[test]
    fn test_parse_full_recipe() {
        let recipe = parse_recipe(RECIPE).unwrap();
        assert_eq!(recipe.profile.name.as_str(), "BMS 8-276 cure");
        assert!(recipe.profile.auto_exotherm_control);
        assert_eq!(recipe.profile.max_exotherm_temp, 190.0);
        assert_eq!(recipe.profile.len(), 2);

        let first = recipe.profile.segment(0).unwrap();
        assert_eq!(first.target_temp, 121.0);
        assert_eq!(first.duration_s, 1800);
        assert_eq!(first.pressure_target, 0.0);

        let second = recipe.profile.segment(1).unwrap();
        assert_eq!(second.heating_rate, 1.5);
        assert_eq!(second.pressure_target, 85.0);

        assert_eq!(recipe.material, MaterialProperties::toughened_epoxy());
        assert_eq!(recipe.validate(&SafetyLimits::default()), Ok(()));
    }

    #[test]
    fn test_material_override() {
        let text = "[material]\npreset = \"tooling_epoxy\"\nalpha_gel = 0.6\n";
        let recipe = parse_recipe(text).unwrap();
        assert_eq!(recipe.material.alpha_gel, 0.6);
        assert_eq!(
            recipe.material.activation_energy,
            MaterialProperties::tooling_epoxy().activation_energy
        );
    }

    #[test]
    fn test_missing_segment_key() {
        let text = "[[segment]]\ntarget_temp = 120\nheating_rate = 2\n";
        assert_eq!(parse_recipe(text), Err(ParseError::MissingKey));
    }

    #[test]
    fn test_unknown_key() {
        let text = "[profile]\nramp_style = \"fast\"\n";
        assert_eq!(parse_recipe(text), Err(ParseError::UnknownKey));
    }

    #[test]
    fn test_unknown_section() {
        assert_eq!(parse_recipe("[oven]\n"), Err(ParseError::InvalidSection));
        assert_eq!(parse_recipe("[[zone]]\n"), Err(ParseError::InvalidSection));
    }

    #[test]
    fn test_key_outside_section() {
        assert_eq!(
            parse_recipe("name = \"x\"\n"),
            Err(ParseError::KeyOutsideSection)
        );
    }

    #[test]
    fn test_invalid_number() {
        let text = "[[segment]]\ntarget_temp = hot\n";
        assert_eq!(parse_recipe(text), Err(ParseError::InvalidValue));
    }

    #[test]
    fn test_hash_inside_string() {
        let text = "[recipe]\nname = \"cure #2\" # second\n";
        let recipe = parse_recipe(text).unwrap();
        assert_eq!(recipe.profile.name.as_str(), "cure #2");
    }

    #[test]
    fn test_comment_after_hashed_strings() {
        assert_eq!(strip_comment("name = \"a#b\" # c # d"), "name = \"a#b\" ");
        assert_eq!(strip_comment("# whole line"), "");
        assert_eq!(strip_comment("target_temp = 177.0"), "target_temp = 177.0");
    }

    #[test]
    fn test_malformed_line() {
        assert_eq!(
            parse_recipe("[profile]\nauto_exotherm_control\n"),
            Err(ParseError::Malformed)
        );
    }
}
