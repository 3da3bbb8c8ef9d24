use hyper::{Body, Response, StatusCode};
use sysinfo::{PidExt, ProcessExt, System, SystemExt};

/// Samples this process's resident memory and returns a `TooManyRequests` response if it's over
/// `limit` bytes, per spec §5 "Memory": "a middleware samples resident memory and refuses new
/// requests over the limit". A fresh `System` per call costs a `/proc` read; acceptable at HTTP
/// request volume, unlike sampling inside the pipeline's hot loops.
pub fn check(limit: Option<u64>) -> Option<Response<Body>> {
    let limit = limit?;

    let pid = sysinfo::get_current_pid().ok()?;
    let mut system = System::new();
    system.refresh_process(pid);
    let used = system.process(pid)?.memory() * 1024;

    if used > limit {
        return Some(
            Response::builder()
                .status(StatusCode::TOO_MANY_REQUESTS)
                .body(Body::from("memory limit exceeded"))
                .expect("static response is well-formed"),
        );
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_when_unconfigured() {
        assert!(check(None).is_none());
    }

    #[test]
    fn rejects_when_ceiling_is_impossibly_low() {
        assert!(check(Some(1)).is_some());
    }
}
