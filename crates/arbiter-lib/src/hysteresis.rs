//! Hysteresis band around the enforced capacity
//!
//! Candidate capacities that land inside the band are treated as noise
//! so small prediction wobbles never restart the enforcement process.

use crate::models::{NmCapacity, RangeBand, RangeResource};

/// Compute the allowed deviation band for cpu (millicores) and memory
/// (MB) around the current capacity.
///
/// Each band is `capacity * ratio` clamped into `[min, max]`, where a
/// configured `min` of 0 does not raise the band. Both ratios at zero
/// disables hysteresis entirely: any change triggers an update.
pub fn range_resource(policy: &RangeResource, capacity: &NmCapacity) -> (f64, f64) {
    if policy.cpu_milli.ratio + policy.mem_mb.ratio == 0.0 {
        return (0.0, 0.0);
    }

    let range_cpu = band_width(&policy.cpu_milli, capacity.millicores);
    let range_mem = band_width(&policy.mem_mb, capacity.memory_mb);
    (range_cpu, range_mem)
}

fn band_width(band: &RangeBand, capacity: i64) -> f64 {
    let mut width = capacity as f64 * band.ratio;
    if band.min != 0.0 && width < band.min {
        width = band.min;
    }
    if width > band.max {
        width = band.max;
    }
    width
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RangeBand;

    fn capacity(millicores: i64, memory_mb: i64) -> NmCapacity {
        NmCapacity {
            vcores: millicores / 1000,
            millicores,
            memory_mb,
        }
    }

    #[test]
    fn test_zero_ratios_disable_hysteresis() {
        let policy = RangeResource::default();
        let (cpu, mem) = range_resource(&policy, &capacity(4000, 8192));
        assert_eq!(cpu, 0.0);
        assert_eq!(mem, 0.0);
    }

    #[test]
    fn test_ratio_scales_current_capacity() {
        let policy = RangeResource {
            cpu_milli: RangeBand {
                ratio: 0.1,
                min: 0.0,
                max: 10_000.0,
            },
            mem_mb: RangeBand {
                ratio: 0.1,
                min: 0.0,
                max: 100_000.0,
            },
        };
        let (cpu, mem) = range_resource(&policy, &capacity(4000, 8192));
        assert_eq!(cpu, 400.0);
        assert!((mem - 819.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_band_clamped_into_min_max() {
        let policy = RangeResource {
            cpu_milli: RangeBand {
                ratio: 0.01,
                min: 200.0,
                max: 300.0,
            },
            mem_mb: RangeBand {
                ratio: 0.5,
                min: 0.0,
                max: 1000.0,
            },
        };
        let (cpu, mem) = range_resource(&policy, &capacity(4000, 8192));
        // 4000 * 0.01 = 40, raised to the minimum
        assert_eq!(cpu, 200.0);
        // 8192 * 0.5 = 4096, capped at the maximum
        assert_eq!(mem, 1000.0);
    }

    #[test]
    fn test_zero_min_is_no_lower_bound() {
        let policy = RangeResource {
            cpu_milli: RangeBand {
                ratio: 0.001,
                min: 0.0,
                max: 300.0,
            },
            mem_mb: RangeBand {
                ratio: 0.0,
                min: 0.0,
                max: 0.0,
            },
        };
        let (cpu, _) = range_resource(&policy, &capacity(4000, 8192));
        assert_eq!(cpu, 4.0);
    }
}
