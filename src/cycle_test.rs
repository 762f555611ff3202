// src/cycle_test.rs - End-to-end cycle tests over the simulated rig
#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::controller::EnclosureController;
    use crate::hardware::HardwareError;
    use crate::simulator;

    fn bench_config() -> Config {
        let mut config = Config::default();
        config.controller.target_humidity = 30.0;
        config.controller.proportional_gain = 5.0;
        config.controller.max_duty = 65535;
        config
    }

    #[tokio::test]
    async fn test_startup_drives_fan_and_indicator_once() {
        let (rig, handle) = simulator::scripted_rig(vec![Ok((21.0, 40.0))], true);
        let mut controller = EnclosureController::new(bench_config(), rig).unwrap();
        controller.start().await.unwrap();

        let state = handle.state();
        assert_eq!(state.fan_on, Some(true));
        assert_eq!(state.color, Some((0, 64, 0)));
        assert!(state.color_committed);
        // Heater parked at zero until the first cycle computes a duty.
        assert_eq!(state.heater_duty, vec![0]);
    }

    #[tokio::test]
    async fn test_cycle_commands_proportional_duty_and_renders() {
        let (rig, handle) = simulator::scripted_rig(vec![Ok((20.0, 32.0))], true);
        let mut controller = EnclosureController::new(bench_config(), rig).unwrap();
        controller.start().await.unwrap();
        controller.run_cycle().await.unwrap();

        let state = handle.state();
        // error 2 at gain 5 is a 10 % ratio of full scale, truncated
        assert_eq!(state.heater_duty.last(), Some(&6553));
        assert_eq!(state.display_commits, 1);
        assert!(state.display_lines.iter().any(|l| l.contains("Temp: 68.0 F")));
        assert!(state.display_lines.iter().any(|l| l.contains("Humi: 32.0 %")));
        assert!(state.display_lines.iter().any(|l| l.contains("Target H: 30 %")));
        assert!(state.display_lines.iter().any(|l| l.contains("Heater: 10 %")));
    }

    #[tokio::test]
    async fn test_sensor_failure_falls_back_and_keeps_controlling() {
        let (rig, handle) = simulator::scripted_rig(vec![Err(HardwareError::Timeout(1000))], true);
        let mut controller = EnclosureController::new(bench_config(), rig).unwrap();
        controller.start().await.unwrap();
        controller.run_cycle().await.unwrap();

        {
            let state = handle.state();
            // Fallback fixture is 10 C / 80 %: error 50 saturates the heater.
            assert_eq!(state.heater_duty.last(), Some(&65535));
            assert_eq!(state.display_commits, 1);
        }

        let snapshot = controller.snapshot().await;
        assert!(snapshot.fallback);
        assert_eq!(snapshot.heater_power, 100.0);
    }

    #[tokio::test]
    async fn test_cycle_without_display_still_controls() {
        let (rig, handle) = simulator::scripted_rig(vec![Ok((20.0, 25.0))], false);
        let mut controller = EnclosureController::new(bench_config(), rig).unwrap();
        controller.start().await.unwrap();
        controller.run_cycle().await.unwrap();

        let state = handle.state();
        // Humidity below target: heater stays off, no display traffic.
        assert_eq!(state.heater_duty.last(), Some(&0));
        assert_eq!(state.display_commits, 0);
    }

    #[test]
    fn test_snapshot_formats_like_the_status_line() {
        let snapshot = tokio_test::block_on(async {
            let (rig, _handle) = simulator::scripted_rig(vec![Ok((20.0, 32.0))], false);
            let mut controller = EnclosureController::new(bench_config(), rig).unwrap();
            controller.start().await.unwrap();
            controller.run_cycle().await.unwrap();
            controller.snapshot().await
        });

        assert_eq!(
            snapshot.to_string(),
            "T: 68.0 F, H: 32.0 %, Target: 30 %, Heater: 10 %"
        );
    }
}
