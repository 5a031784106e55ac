//! CLI Doctor Command
//!
//! Reports the effective config, validation findings, the language model
//! credential and whether PDF pages can be rendered.

use anyhow::Result;
use docquery_config::{redacted_json, validate, DocQueryConfig};
use docquery_loader::PdfiumRasterizer;

use crate::runtime::Runtime;

/// One line of the doctor report.
#[derive(Debug)]
pub struct Check {
    pub name: &'static str,
    pub ok: bool,
    /// Failures that only limit functionality, e.g. no pdf rendering.
    pub optional: bool,
    pub detail: String,
}

impl Check {
    fn symbol(&self) -> &'static str {
        match (self.ok, self.optional) {
            (true, _) => "🟢",
            (false, true) => "🟡",
            (false, false) => "🔴",
        }
    }
}

/// Checks that depend only on the config and the local machine.
pub fn collect_checks(runtime: &Runtime) -> Vec<Check> {
    let config = &runtime.config;
    let mut checks = Vec::new();

    let report = validate(config);
    checks.push(Check {
        name: "config",
        ok: report.is_valid(),
        optional: false,
        detail: if report.is_valid() {
            format!("{} warning(s)", report.warnings.len())
        } else {
            report
                .errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        },
    });

    checks.push(Check {
        name: "provider",
        ok: runtime.setup.credential_present,
        optional: false,
        detail: match &runtime.setup.message {
            Some(message) => message.clone(),
            None => format!("{} ({})", runtime.setup.provider, runtime.setup.model),
        },
    });

    checks.push(pdfium_check(config));
    checks
}

fn pdfium_check(config: &DocQueryConfig) -> Check {
    let rasterizer =
        PdfiumRasterizer::new(config.pdf.pdfium_library_path.clone(), config.pdf.render_width);
    match rasterizer.check_library() {
        Ok(()) => Check {
            name: "pdfium",
            ok: true,
            optional: true,
            detail: "PDF pages can be rendered".to_string(),
        },
        Err(e) => Check {
            name: "pdfium",
            ok: false,
            optional: true,
            detail: format!("{e}; PDF uploads will fail"),
        },
    }
}

/// Executes the full doctor diagnosis.
pub async fn run(runtime: &Runtime) -> Result<()> {
    println!("\n🔍 Running DocQuery Doctor...\n");

    println!("Effective config:");
    println!("{}\n", serde_json::to_string_pretty(&redacted_json(&runtime.config)?)?);

    for warning in validate(&runtime.config).warnings {
        println!("  🟡 {warning}");
    }

    let checks = collect_checks(runtime);
    for check in &checks {
        println!("  {} {}: {}", check.symbol(), check.name, check.detail);
    }

    println!();
    if checks.iter().all(|c| c.ok || c.optional) {
        println!("✅ DocQuery is ready.");
    } else {
        println!("❌ Some checks failed! Please fix the errors above.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docquery_config::apply_all_defaults;

    fn runtime(provider: &str, key: Option<&str>) -> Runtime {
        let mut config = DocQueryConfig::default();
        config.llm.provider = provider.into();
        config.llm.api_key = key.map(str::to_string);
        Runtime::build(apply_all_defaults(config))
    }

    fn find<'a>(checks: &'a [Check], name: &str) -> &'a Check {
        checks.iter().find(|c| c.name == name).unwrap()
    }

    #[test]
    fn missing_key_fails_provider_check() {
        let checks = collect_checks(&runtime("openai", None));
        let provider = find(&checks, "provider");
        assert!(!provider.ok);
        assert!(provider.detail.contains("OPENAI_API_KEY"));
        assert!(find(&checks, "config").ok);
    }

    #[test]
    fn configured_provider_passes() {
        let checks = collect_checks(&runtime("openai", Some("sk-test")));
        assert_eq!(find(&checks, "provider").detail, "openai (gpt-4o-mini)");
        assert!(find(&checks, "pdfium").optional);
    }

    #[test]
    fn bad_temperature_fails_config_check() {
        let mut config = DocQueryConfig::default();
        config.llm.temperature = 3.0;
        let checks = collect_checks(&Runtime::build(apply_all_defaults(config)));
        assert!(!find(&checks, "config").ok);
    }
}
