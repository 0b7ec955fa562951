use anyhow::Error;
use std::path::Path;

fn program_name() -> String {
    std::env::args()
        .next()
        .as_ref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "xdf".to_string())
}

#[allow(dead_code)]
pub fn die(error: &Error) -> ! {
    eprintln!("{}: error: {}", program_name(), error);
    #[cfg(feature = "backtrace")]
    eprintln!("{}", error.backtrace());
    std::process::exit(1);
}

#[allow(dead_code)]
pub fn or_die<T>(result: Result<T, Error>) -> T {
    match result {
        Ok(t) => t,
        Err(ref e) => die(e),
    }
}
