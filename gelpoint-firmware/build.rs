//! Build script for gelpoint-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates recipe.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Material presets the on-target parser knows
const PRESETS: &[&str] = &["toughened_epoxy", "tooling_epoxy"];

/// Full vacuum, mmHg below atmosphere
const FULL_VACUUM_MMHG: f64 = 760.0;

fn main() {
    setup_linker();
    validate_recipe();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate recipe.toml at compile time
fn validate_recipe() {
    println!("cargo:rerun-if-changed=recipe.toml");

    let recipe_path = Path::new("recipe.toml");

    if !recipe_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: recipe.toml not found!                                   ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds the cure recipe it runs at boot.            ║\n\
            ║  Please create one in the gelpoint-firmware directory.           ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let content = match fs::read_to_string(recipe_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read recipe.toml", &[e.to_string()]),
    };

    let recipe: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            let lines: Vec<String> = e.to_string().lines().map(str::to_string).collect();
            fail("Invalid TOML syntax in recipe.toml", &lines);
        }
    };

    let mut errors = Vec::new();
    validate_sections(&recipe, &mut errors);
    validate_material(&recipe, &mut errors);
    validate_segments(&recipe, &mut errors);

    if !errors.is_empty() {
        fail("Invalid recipe in recipe.toml", &errors);
    }

    println!("cargo:warning=recipe.toml validated successfully");
}

/// Abort the build with a boxed error listing
fn fail(title: &str, errors: &[String]) -> ! {
    let body = errors
        .iter()
        .map(|e| {
            let line = if e.len() > 62 {
                format!("{}...", &e[..59])
            } else {
                e.clone()
            };
            format!("║  • {:<62} ║", line)
        })
        .collect::<Vec<_>>()
        .join("\n");
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title, body
    );
}

fn number(value: &toml::Value) -> Option<f64> {
    match value {
        toml::Value::Float(f) => Some(*f),
        toml::Value::Integer(i) => Some(*i as f64),
        _ => None,
    }
}

/// Required tables
fn validate_sections(recipe: &toml::Value, errors: &mut Vec<String>) {
    if !matches!(recipe.get("recipe"), Some(toml::Value::Table(_))) {
        errors.push("Missing [recipe] table".into());
    }
    if !matches!(recipe.get("material"), Some(toml::Value::Table(_))) {
        errors.push("Missing [material] table".into());
    }
    match recipe.get("segment") {
        Some(toml::Value::Array(segments)) if !segments.is_empty() => {}
        _ => errors.push("Missing [[segment]] - at least one is required".into()),
    }
    if let Some(toml::Value::String(name)) = recipe.get("recipe").and_then(|r| r.get("name")) {
        if name.len() > 24 {
            errors.push("[recipe] name must be at most 24 characters".into());
        }
    }
}

fn validate_material(recipe: &toml::Value, errors: &mut Vec<String>) {
    let material = match recipe.get("material") {
        Some(toml::Value::Table(t)) => t,
        _ => return,
    };

    if let Some(preset) = material.get("preset") {
        match preset.as_str() {
            Some(p) if PRESETS.contains(&p) => {}
            _ => errors.push(format!("[material] preset must be one of {:?}", PRESETS)),
        }
    }

    for (key, value) in material {
        if key == "preset" {
            continue;
        }
        match number(value) {
            Some(v) if v.is_finite() => {}
            _ => errors.push(format!("[material] {} must be a number", key)),
        }
    }

    if let Some(alpha) = material.get("alpha_gel").and_then(number) {
        if alpha <= 0.0 || alpha >= 1.0 {
            errors.push("[material] alpha_gel must be between 0 and 1".into());
        }
    }
}

fn validate_segments(recipe: &toml::Value, errors: &mut Vec<String>) {
    let segments = match recipe.get("segment") {
        Some(toml::Value::Array(s)) => s,
        _ => return,
    };

    if segments.len() > 16 {
        errors.push("At most 16 segments are supported".into());
    }

    for (i, segment) in segments.iter().enumerate() {
        let segment = match segment.as_table() {
            Some(t) => t,
            None => {
                errors.push(format!("segment {} must be a table", i));
                continue;
            }
        };

        if segment.get("target_temp").and_then(number).is_none() {
            errors.push(format!("segment {} missing 'target_temp'", i));
        }
        match segment.get("heating_rate").and_then(number) {
            Some(rate) if rate > 0.0 => {}
            Some(_) => errors.push(format!("segment {} heating_rate must be positive", i)),
            None => errors.push(format!("segment {} missing 'heating_rate'", i)),
        }
        if segment.get("duration_min").is_none() && segment.get("duration_s").is_none() {
            errors.push(format!("segment {} missing 'duration_min'", i));
        }
        if let Some(vacuum) = segment.get("vacuum_target").and_then(number) {
            if !(0.0..=FULL_VACUUM_MMHG).contains(&vacuum) {
                errors.push(format!("segment {} vacuum_target must be 0-760", i));
            }
        }
        if let Some(pressure) = segment.get("pressure_target").and_then(number) {
            if pressure < 0.0 {
                errors.push(format!("segment {} pressure_target must be >= 0", i));
            }
        }
    }
}
