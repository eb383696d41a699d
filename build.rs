use std::process::Command;

fn main() {
    // sqlx::migrate! embeds the migrations/ directory at compile time; a
    // schema change must trigger a rebuild or the binary ships a stale
    // wallet schema.
    println!("cargo:rerun-if-changed=migrations");

    // Short commit hash for the startup log; "unknown" outside a checkout.
    let git_hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
}
