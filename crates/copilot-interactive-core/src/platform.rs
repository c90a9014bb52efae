//! Host detection used to pick a notification backend.

pub fn is_windows() -> bool {
    cfg!(windows)
}

pub fn is_linux() -> bool {
    cfg!(target_os = "linux")
}

/// Human readable name of the host operating system.
pub fn platform_name() -> &'static str {
    match std::env::consts::OS {
        "windows" => "Windows",
        "linux" => "Linux",
        "macos" => "Darwin",
        "android" => "Android",
        "freebsd" => "FreeBSD",
        other => other,
    }
}
