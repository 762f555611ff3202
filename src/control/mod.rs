// src/control/mod.rs - Proportional humidity control law
use crate::config::ControllerConfig;

/// Compute the heater duty for the current humidity sample.
///
/// Heat-only response: raising temperature lowers relative humidity,
/// but there is no actuator for the other direction, so humidity at or
/// below target idles the heater rather than driving it negative.
/// Single proportional term, no integral memory, no rate limiting:
/// every cycle starts from scratch.
pub fn compute_duty(current_humidity: f64, config: &ControllerConfig) -> u32 {
    let error = current_humidity - config.target_humidity;
    if error <= 0.0 {
        return 0;
    }

    // Duty ratio in percent, clamped to the actuator's usable range.
    let ratio = (config.proportional_gain * error).clamp(0.0, 100.0);

    // The integer cast truncates toward zero.
    (ratio / 100.0 * config.max_duty as f64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bench_config() -> ControllerConfig {
        ControllerConfig {
            target_humidity: 30.0,
            proportional_gain: 5.0,
            max_duty: 65535,
            ..ControllerConfig::default()
        }
    }

    #[test]
    fn test_saturates_at_full_scale() {
        // error 50, ratio clamps at 100, full duty
        assert_eq!(compute_duty(80.0, &bench_config()), 65535);
    }

    #[test]
    fn test_at_or_below_target_is_off() {
        let config = bench_config();
        assert_eq!(compute_duty(25.0, &config), 0);
        assert_eq!(compute_duty(30.0, &config), 0);
        assert_eq!(compute_duty(0.0, &config), 0);
    }

    #[test]
    fn test_proportional_band() {
        // error 2, ratio 10 % of 65535, truncated
        assert_eq!(compute_duty(32.0, &bench_config()), 6553);
    }

    #[test]
    fn test_monotonic_until_clamp_then_pinned() {
        let config = bench_config();
        let mut previous = 0;
        for step in 0..400 {
            let humidity = 30.0 + step as f64 * 0.1;
            let duty = compute_duty(humidity, &config);
            assert!(duty >= previous);
            assert!(duty <= config.max_duty);
            previous = duty;
        }
        assert_eq!(previous, config.max_duty);
        assert_eq!(compute_duty(95.0, &config), config.max_duty);
    }
}
