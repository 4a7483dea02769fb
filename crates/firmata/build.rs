use std::process::Command;

fn main() {
    if let Ok(target) = std::env::var("TARGET") {
        println!("cargo:rustc-env=FIRMATA_BUILD_TARGET={target}");
    }
    if let Ok(profile) = std::env::var("PROFILE") {
        println!("cargo:rustc-env=FIRMATA_BUILD_PROFILE={profile}");
    }

    // Release tarballs have no .git; fall back to an explicit GIT_HASH.
    let git_hash = std::env::var("GIT_HASH").ok().or_else(|| {
        Command::new("git")
            .args(["rev-parse", "--short=12", "HEAD"])
            .output()
            .ok()
            .filter(|out| out.status.success())
            .and_then(|out| String::from_utf8(out.stdout).ok())
            .map(|hash| hash.trim().to_string())
            .filter(|hash| !hash.is_empty())
    });
    if let Some(hash) = git_hash {
        println!("cargo:rustc-env=FIRMATA_GIT_HASH={hash}");
    }

    println!("cargo:rerun-if-env-changed=TARGET");
    println!("cargo:rerun-if-env-changed=PROFILE");
    println!("cargo:rerun-if-env-changed=GIT_HASH");
}
