//! Wall-clock timing helpers

use std::time::Instant;

use tracing::debug;

/// Run `f` and return its result with the elapsed wall-clock seconds
pub fn measure_seconds<F, R>(f: F) -> (R, f64)
where
    F: FnOnce() -> R,
{
    let start = Instant::now();
    let result = f();
    (result, start.elapsed().as_secs_f64())
}

/// [`measure_seconds`], logging the elapsed time under `label`
pub fn timed<F, R>(label: &str, f: F) -> R
where
    F: FnOnce() -> R,
{
    let (result, seconds) = measure_seconds(f);
    debug!("{} took {:.4}s", label, seconds);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_measure_returns_result() {
        let (value, seconds) = measure_seconds(|| 7 * 6);
        assert_eq!(value, 42);
        assert!(seconds >= 0.0);
    }

    #[test]
    fn test_measure_covers_sleep() {
        let ((), seconds) = measure_seconds(|| std::thread::sleep(Duration::from_millis(20)));
        assert!(seconds >= 0.02, "elapsed {}", seconds);
    }

    #[test]
    fn test_timed_passes_through_errors() {
        let result: Result<(), &str> = timed("failing", || Err("boom"));
        assert_eq!(result, Err("boom"));
    }
}
