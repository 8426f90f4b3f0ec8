// Embed git hash for --version. Optional; no git = plain crate version.
fn main() {
    let mut long_version =
        std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "unknown".to_owned());

    if let Ok(output) = std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
    {
        if output.status.success() {
            if let Ok(s) = String::from_utf8(output.stdout) {
                let hash = s.trim();
                if !hash.is_empty() {
                    long_version = format!("{long_version} ({hash})");
                }
            }
        }
    }

    println!("cargo:rustc-env=KALEIDO_LONG_VERSION={long_version}");
}
