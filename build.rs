use std::process::Command;

fn main() {
    // Release builds report the crate version; dev builds report the short
    // git hash so log output identifies the exact tree.
    let version = if std::env::var("PROFILE").as_deref() == Ok("release") {
        env!("CARGO_PKG_VERSION").to_string()
    } else {
        git_short_hash().unwrap_or_else(|| "unknown".to_string())
    };

    println!("cargo:rustc-env=VERSION_STRING={}", version);
}

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8(output.stdout).ok()?.trim().to_string())
}
