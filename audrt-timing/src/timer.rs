use std::time::{Duration, Instant};

/// Clock seam for the trial engine. Reaction times are measured against
/// `now()`, and the fixed fixation/feedback holds go through `sleep()` so
/// tests can run trials without real delays.
pub trait Timer: Clone + Send {
    fn now(&self) -> Instant;

    fn elapsed(&self, since: Instant) -> Duration {
        self.now().saturating_duration_since(since)
    }

    fn sleep(&self, d: Duration);
}

/// Monotonic timer with platform-specific precision sleep. Plain
/// `thread::sleep` overshoots by a scheduler quantum on some platforms,
/// which is visible at the 500 ms fixation hold.
#[derive(Debug, Clone)]
pub struct HighPrecisionTimer;

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self
    }

    fn high_precision_sleep(&self, duration: Duration) {
        #[cfg(target_os = "windows")]
        self.windows_sleep(duration);
        #[cfg(target_os = "linux")]
        self.linux_sleep(duration);
        #[cfg(target_os = "macos")]
        self.macos_sleep(duration);
        #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
        std::thread::sleep(duration);
    }

    #[cfg(target_os = "windows")]
    fn windows_sleep(&self, duration: Duration) {
        use windows::Win32::Foundation::CloseHandle;
        use windows::Win32::System::Threading::{
            CreateWaitableTimerW, SetWaitableTimer, WaitForSingleObject,
        };

        unsafe {
            let timer = match CreateWaitableTimerW(None, true, None) {
                Ok(t) => t,
                Err(_) => {
                    std::thread::sleep(duration);
                    return;
                }
            };

            // Negative due time = relative, in 100 ns intervals.
            let due = -(duration.as_nanos() as i64 / 100);
            if SetWaitableTimer(timer, &due, 0, None, None, false).is_ok() {
                WaitForSingleObject(timer, u32::MAX);
            }

            let _ = CloseHandle(timer);
        }
    }

    #[cfg(target_os = "linux")]
    fn linux_sleep(&self, duration: Duration) {
        use libc::{clock_nanosleep, timespec, CLOCK_MONOTONIC};

        let req = timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };

        unsafe {
            clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
        }
    }

    #[cfg(target_os = "macos")]
    fn macos_sleep(&self, duration: Duration) {
        use mach2::mach_time::{mach_absolute_time, mach_timebase_info, mach_timebase_info_data_t};

        // Spin only for sub-100µs waits; the holds in this task are long
        // enough that a plain sleep is fine.
        if duration.as_nanos() < 100_000 {
            unsafe {
                let start = mach_absolute_time();
                let mut timebase = mach_timebase_info_data_t { numer: 0, denom: 0 };
                mach_timebase_info(&mut timebase);

                let target_ticks =
                    duration.as_nanos() as u64 * timebase.denom as u64 / timebase.numer as u64;

                while mach_absolute_time() - start < target_ticks {
                    std::hint::spin_loop();
                }
            }
        } else {
            std::thread::sleep(duration);
        }
    }
}

impl Timer for HighPrecisionTimer {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, d: Duration) {
        self.high_precision_sleep(d)
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_measures_forward() {
        let timer = HighPrecisionTimer::new();
        let t0 = timer.now();
        timer.sleep(Duration::from_millis(5));
        let dt = timer.elapsed(t0);
        assert!(dt >= Duration::from_millis(5));
        assert!(dt < Duration::from_secs(1));
    }

    #[test]
    fn elapsed_saturates_for_future_instants() {
        let timer = HighPrecisionTimer::new();
        let future = timer.now() + Duration::from_secs(10);
        assert_eq!(timer.elapsed(future), Duration::ZERO);
    }
}
