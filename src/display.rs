use crate::OutputFormat;
use crate::error::SupakeyError;
use crate::sync::SyncReport;

// Status lines go through tracing so RUST_LOG and NO_COLOR apply uniformly
pub fn print_success(message: &str) {
    tracing::info!("✅ {}", message);
}

pub fn print_info(message: &str) {
    tracing::info!("{}", message);
}

pub fn print_warning(message: &str) {
    tracing::warn!("{}", message);
}

pub fn print_error(message: &str) {
    tracing::error!("{}", message);
}

const PREVIEW_CHARS: usize = 20;

/// Show only the first and last 20 characters of a key.
/// Keys too short to hide anything that way are fully masked.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= PREVIEW_CHARS * 2 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..PREVIEW_CHARS].iter().collect();
    let tail: String = chars[chars.len() - PREVIEW_CHARS..].iter().collect();
    format!("{}...{}", head, tail)
}

pub fn print_report(report: &SyncReport, format: &OutputFormat) -> Result<(), SupakeyError> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Table => {
            println!();
            println!("🎉 Success! API key has been updated in {}", report.env_file.display());
            println!("   Key source: {}", report.source);
            println!("   Key preview: {}", report.preview);
            println!("   Backup: {}", report.backup.display());
            println!();
            println!("🔧 You can now restart your development server to use the new key");
            println!();
            println!("To verify the update:");
            println!("  grep {} {}", report.variable, report.env_file.display());
        }
    }
    Ok(())
}

/// Operator guide for copying the key out of the dashboard by hand.
pub fn manual_guidance(dashboard_url: &str, selectors: &[&str]) -> String {
    let mut text = String::new();
    text.push_str("\n🔍 Manual API Key Extraction Guide:\n");
    text.push_str(&"=".repeat(50));
    text.push('\n');
    text.push_str("1. Open your browser and navigate to:\n");
    text.push_str(&format!("   {}\n\n", dashboard_url));
    text.push_str("2. Log in to your Supabase account if prompted\n\n");
    text.push_str("3. On the API Settings page, look for:\n");
    text.push_str("   📋 'Project API keys' section\n");
    text.push_str("   🔑 'anon' or 'public' key (starts with 'eyJ')\n");
    text.push_str("   📄 The key should be quite long (200+ characters)\n\n");
    text.push_str("4. DOM Elements to look for:\n");
    text.push_str("   • Tables with 'anon' or 'public' in the row\n");
    text.push_str("   • Code blocks or <pre> elements\n");
    text.push_str("   • Copy buttons next to long text strings\n");
    text.push_str("   • Elements with data-testid containing 'anon' or 'api-key'\n\n");
    text.push_str("5. CSS Selectors to inspect:\n");
    for selector in selectors {
        text.push_str(&format!("   • {}\n", selector));
    }
    text
}
