//! Build script for gantry-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates machine.toml at compile time

use std::collections::HashMap;
use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Sections machine.toml must contain
const REQUIRED_SECTIONS: [&str; 5] = ["geometry", "motion", "homing", "protocol", "pins"];

/// Pin keys under [pins]
const PIN_KEYS: [&str; 6] = ["step_a", "dir_a", "step_b", "dir_b", "limit_x", "limit_y"];

/// GPIO0/1 carry the command UART
const FIRST_FREE_GPIO: u32 = 2;
const LAST_GPIO: u32 = 29;

/// Must match `gantry_core::config::CONFIG_VERSION`
const CONFIG_VERSION: i64 = 1;

fn main() {
    setup_linker();
    validate_config();
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

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate machine.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=machine.toml");

    let config_path = Path::new("machine.toml");

    if !config_path.exists() {
        fail(
            "machine.toml not found",
            &["The firmware embeds machine.toml from the gantry-firmware directory".to_string()],
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read machine.toml", &[e.to_string()]),
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => fail(
            "Invalid TOML syntax in machine.toml",
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    };

    let mut errors = Vec::new();
    validate_sections(&config, &mut errors);
    validate_geometry(&config, &mut errors);
    validate_motion(&config, &mut errors);
    validate_homing(&config, &mut errors);
    validate_protocol(&config, &mut errors);
    validate_pins(&config, &mut errors);

    if !errors.is_empty() {
        fail("Invalid machine.toml", &errors);
    }

    println!("cargo:warning=machine.toml validated successfully");
}

/// Abort the build with a boxed report
fn fail(title: &str, lines: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<57}║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        lines
            .iter()
            .map(|line| {
                let truncated = if line.chars().count() > 62 {
                    format!("{}...", line.chars().take(59).collect::<String>())
                } else {
                    line.clone()
                };
                format!("║  • {:<62} ║", truncated)
            })
            .collect::<Vec<_>>()
            .join("\n")
    );
}

fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    if let Some(version) = config.get("version") {
        if version.as_integer() != Some(CONFIG_VERSION) {
            errors.push(format!("version must be {}", CONFIG_VERSION));
        }
    }

    for section in REQUIRED_SECTIONS {
        match config.get(section) {
            Some(toml::Value::Table(_)) => {}
            Some(_) => errors.push(format!("[{}] must be a table", section)),
            None => errors.push(format!("Missing [{}] section", section)),
        }
    }

    if let Some(table) = config.as_table() {
        for (key, _) in table {
            if key != "version" && !REQUIRED_SECTIONS.contains(&key.as_str()) {
                errors.push(format!("Unknown top-level key '{}'", key));
            }
        }
    }
}

/// Read a number that may be written as an integer or a float
fn number(section: &toml::Value, key: &str) -> Option<Result<f64, ()>> {
    section.get(key).map(|v| match v {
        toml::Value::Float(f) => Ok(*f),
        toml::Value::Integer(i) => Ok(*i as f64),
        _ => Err(()),
    })
}

/// Check an optional key holds a positive, finite number
fn check_positive(section: &toml::Value, name: &str, key: &str, errors: &mut Vec<String>) {
    match number(section, key) {
        Some(Ok(v)) if v.is_finite() && v > 0.0 => {}
        Some(_) => errors.push(format!("[{}] {} must be a positive number", name, key)),
        None => {}
    }
}

/// Check an optional key holds one of the given strings
fn check_choice(
    section: &toml::Value,
    name: &str,
    key: &str,
    choices: &[&str],
    errors: &mut Vec<String>,
) {
    if let Some(value) = section.get(key) {
        match value.as_str() {
            Some(s) if choices.contains(&s) => {}
            _ => errors.push(format!(
                "[{}] {} must be one of: {}",
                name,
                key,
                choices.join(", ")
            )),
        }
    }
}

/// Reject keys the firmware parser does not know
fn check_keys(section: &toml::Value, name: &str, known: &[&str], errors: &mut Vec<String>) {
    if let Some(table) = section.as_table() {
        for key in table.keys() {
            if !known.contains(&key.as_str()) {
                errors.push(format!("[{}] unknown key '{}'", name, key));
            }
        }
    }
}

fn validate_geometry(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(geometry) = config.get("geometry") else {
        return;
    };

    check_keys(
        geometry,
        "geometry",
        &["pulley_circumference_mm", "pulley_diameter_mm", "step_angle_deg", "microsteps"],
        errors,
    );
    check_positive(geometry, "geometry", "pulley_circumference_mm", errors);
    check_positive(geometry, "geometry", "pulley_diameter_mm", errors);
    check_positive(geometry, "geometry", "step_angle_deg", errors);

    if geometry.get("pulley_circumference_mm").is_some()
        && geometry.get("pulley_diameter_mm").is_some()
    {
        errors.push(
            "[geometry] set pulley_circumference_mm or pulley_diameter_mm, not both".to_string(),
        );
    }

    if let Some(microsteps) = geometry.get("microsteps") {
        match microsteps.as_integer() {
            Some(m) if (1..=256).contains(&m) => {}
            _ => errors.push("[geometry] microsteps must be 1-256".to_string()),
        }
    }
}

fn validate_motion(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(motion) = config.get("motion") else {
        return;
    };

    check_keys(
        motion,
        "motion",
        &["max_speed", "acceleration", "units", "require_homing"],
        errors,
    );
    check_positive(motion, "motion", "max_speed", errors);
    check_positive(motion, "motion", "acceleration", errors);
    check_choice(motion, "motion", "units", &["steps", "mm", "millimeters"], errors);

    if let Some(value) = motion.get("require_homing") {
        if !value.is_bool() {
            errors.push("[motion] require_homing must be true or false".to_string());
        }
    }
}

fn validate_homing(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(homing) = config.get("homing") else {
        return;
    };

    check_keys(homing, "homing", &["speed", "timeout_ms"], errors);
    check_positive(homing, "homing", "speed", errors);

    if let Some(timeout) = homing.get("timeout_ms") {
        match timeout.as_integer() {
            Some(t) if t > 0 && t <= i64::from(u32::MAX) => {}
            _ => errors.push("[homing] timeout_ms must be a positive integer".to_string()),
        }
    }
}

fn validate_protocol(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(protocol) = config.get("protocol") else {
        return;
    };

    check_keys(protocol, "protocol", &["numeric", "unknown", "done", "mode"], errors);
    check_choice(protocol, "protocol", "numeric", &["best_effort", "strict"], errors);
    check_choice(protocol, "protocol", "unknown", &["stop", "ignore"], errors);
    check_choice(
        protocol,
        "protocol",
        "done",
        &["on_transition", "every_idle_tick"],
        errors,
    );
    check_choice(
        protocol,
        "protocol",
        "mode",
        &["run_to_completion", "preemptible"],
        errors,
    );
}

/// Parse "gpioN" with optional "!" (active-low) and "^" (pull-up) prefixes
fn parse_pin(value: &str) -> Option<u32> {
    value
        .trim_start_matches(['!', '^'])
        .strip_prefix("gpio")
        .and_then(|n| n.parse().ok())
}

fn validate_pins(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(pins) = config.get("pins") else {
        return;
    };

    check_keys(pins, "pins", &PIN_KEYS, errors);

    let mut used: HashMap<u32, &str> = HashMap::new();

    for key in PIN_KEYS {
        let Some(value) = pins.get(key) else {
            continue;
        };

        let Some(pin) = value.as_str().and_then(parse_pin) else {
            errors.push(format!("[pins] {} must look like \"gpio2\"", key));
            continue;
        };

        if !(FIRST_FREE_GPIO..=LAST_GPIO).contains(&pin) {
            errors.push(format!(
                "[pins] {} = gpio{} is outside gpio{}-gpio{}",
                key, pin, FIRST_FREE_GPIO, LAST_GPIO
            ));
        }

        if let Some(other) = used.insert(pin, key) {
            errors.push(format!("[pins] gpio{} used by both {} and {}", pin, other, key));
        }
    }
}
