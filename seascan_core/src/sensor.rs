// seascan_core/src/sensor.rs

//! The side-scan sonar sensor: owns the grid, the compute context, the
//! per-tick scratch arena and the persistent waterfall, and runs the whole
//! pipeline once per call to [`SideScanSonar::scan`].

use crate::binning::{self, BinAccumulator};
use crate::compose::{self, NormalizingMethod};
use crate::dispatch::{AtomicF32Buffer, ComputeContext};
use crate::error::SonarError;
use crate::geometry;
use crate::grid::SonarGrid;
use crate::intensity;
use crate::noise;
use crate::types::{ProfileSample, ScanFrame};
use crate::waterfall::{self, Waterfall, CHANNELS};
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

/// Construction-time parameters of the sensor. Validated once in
/// [`SideScanSonar::new`]; invalid values are setup-time contract violations,
/// not runtime conditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SideScanSonarConfig {
    /// Lower edge of the coverage window in meters. Must be positive so that
    /// degenerate points (range 0) fall below coverage.
    pub min_range: f32,
    /// Upper edge of the coverage window in meters.
    pub max_range: f32,
    /// Bin width in meters.
    pub range_resolution: f32,
    /// Distance attenuation coefficient of the intensity model.
    pub attenuation: f32,
    /// Standard deviation of the multiplicative Gaussian speckle.
    pub gaussian_noise_stddev: f32,
    /// Scale of the additive range-dependent Rayleigh noise.
    pub rayleigh_noise_scale: f32,
    /// Post-normalization intensity offset.
    pub intensity_offset: f32,
    /// Post-normalization intensity gain.
    pub intensity_gain: f32,
    /// Central beam streak strength. Accepted for configuration
    /// compatibility with the 2D imaging variant; has no observable effect
    /// on the 1D profile.
    pub central_peak: f32,
    /// Central beam streak spread. Inert in the 1D profile, as above.
    pub central_std: f32,
    pub normalizing_method: NormalizingMethod,
    /// Number of history rows kept in the waterfall display.
    pub waterfall_height: usize,
}

impl Default for SideScanSonarConfig {
    fn default() -> Self {
        Self {
            min_range: 8.0,
            max_range: 10.0,
            range_resolution: 0.001,
            attenuation: 1.0,
            gaussian_noise_stddev: 0.05,
            rayleigh_noise_scale: 0.05,
            intensity_offset: 0.0,
            intensity_gain: 1.0,
            central_peak: 0.0,
            central_std: 0.001,
            normalizing_method: NormalizingMethod::Range,
            waterfall_height: 720,
        }
    }
}

impl SideScanSonarConfig {
    fn validate(&self) -> Result<(), SonarError> {
        if !self.min_range.is_finite() || self.min_range <= 0.0 {
            return Err(SonarError::NonPositiveMinRange(self.min_range));
        }
        if !self.max_range.is_finite() || self.min_range >= self.max_range {
            return Err(SonarError::InvalidRangeWindow {
                min: self.min_range,
                max: self.max_range,
            });
        }
        if !self.range_resolution.is_finite() || self.range_resolution <= 0.0 {
            return Err(SonarError::InvalidRangeResolution(self.range_resolution));
        }
        if self.waterfall_height == 0 {
            return Err(SonarError::InvalidWaterfallHeight);
        }
        for parameter in [self.gaussian_noise_stddev, self.rayleigh_noise_scale] {
            if !parameter.is_finite() || parameter < 0.0 {
                return Err(SonarError::InvalidNoiseParameter(parameter));
            }
        }
        Ok(())
    }

    /// Number of range bins covering `[min_range, max_range)`.
    fn bin_count(&self) -> usize {
        ((self.max_range - self.min_range) / self.range_resolution).ceil() as usize
    }
}

/// Every per-tick working buffer, owned by the sensor and reset (not
/// reallocated) at the start of each tick. The point-sized buffers grow to
/// the largest frame seen and stay there.
struct ScratchArena {
    ranges: Vec<f32>,
    intensities: Vec<f32>,
    reflectivity_lut: Vec<f32>,
    bins: BinAccumulator,
    bin_sums: Vec<f32>,
    bin_counts: Vec<u32>,
    gaussian_noise: Vec<f32>,
    rayleigh_noise: Vec<f32>,
    max_intensity: AtomicF32Buffer,
    row: Vec<u8>,
}

impl ScratchArena {
    fn new(bin_count: usize, method: NormalizingMethod) -> Self {
        Self {
            ranges: Vec::new(),
            intensities: Vec::new(),
            reflectivity_lut: Vec::new(),
            bins: BinAccumulator::new(bin_count),
            bin_sums: Vec::with_capacity(bin_count),
            bin_counts: Vec::with_capacity(bin_count),
            gaussian_noise: vec![0.0; bin_count],
            rayleigh_noise: vec![0.0; bin_count],
            max_intensity: AtomicF32Buffer::new(method.max_buffer_len(bin_count)),
            row: vec![0u8; bin_count * CHANNELS],
        }
    }

    fn resize_points(&mut self, n: usize) {
        self.ranges.resize(n, 0.0);
        self.intensities.resize(n, 0.0);
    }
}

/// A simulated 1D side-scan sonar.
///
/// Feed it one [`ScanFrame`] per simulation tick; each successful scan
/// produces a fresh profile, a rasterized image row and a new top row in the
/// waterfall buffer.
pub struct SideScanSonar {
    config: SideScanSonarConfig,
    grid: SonarGrid,
    /// Lower-edge range of every bin, fixed at construction.
    bin_ranges: Vec<f32>,
    ctx: ComputeContext,
    gaussian_dist: Normal<f32>,
    scratch: ScratchArena,
    profile: Vec<ProfileSample>,
    averages: Vec<f32>,
    waterfall: Waterfall,
    tick: u64,
    dropped_last_tick: u32,
}

impl SideScanSonar {
    pub fn new(config: SideScanSonarConfig, ctx: ComputeContext) -> Result<Self, SonarError> {
        config.validate()?;

        let bin_count = config.bin_count();
        let grid = SonarGrid::new(config.min_range, config.range_resolution, bin_count)?;
        let bin_ranges = grid.bin_ranges();

        let gaussian_dist = Normal::new(0.0, config.gaussian_noise_stddev)
            .map_err(|_| SonarError::InvalidNoiseParameter(config.gaussian_noise_stddev))?;

        let scratch = ScratchArena::new(bin_count, config.normalizing_method);
        let waterfall = Waterfall::new(bin_count, config.waterfall_height);

        Ok(Self {
            config,
            grid,
            bin_ranges,
            ctx,
            gaussian_dist,
            scratch,
            profile: vec![ProfileSample::default(); bin_count],
            averages: vec![0.0; bin_count],
            waterfall,
            tick: 0,
            dropped_last_tick: 0,
        })
    }

    /// Runs the full pipeline for one tick.
    ///
    /// Returns `Ok(false)` without touching any buffer when the frame's
    /// semantic label table is empty or the point cloud has no points (the
    /// warm-up / nothing-in-view condition). The waterfall then keeps the
    /// previous frame's rows rather than gaining a blank one.
    pub fn scan(&mut self, frame: &ScanFrame) -> Result<bool, SonarError> {
        // The counter advances on every attempt, including skipped ticks, so
        // noise seeds stay aligned with host frame numbers.
        self.tick += 1;

        if frame.labels.is_empty() || frame.is_empty() {
            return Ok(false);
        }
        frame.validate()?;

        let n = frame.len();
        frame
            .labels
            .reflectivity_lut_into(&mut self.scratch.reflectivity_lut);
        self.scratch.resize_points(n);

        // Stage 1: world-space positions -> sensor-local ranges.
        geometry::compute_ranges(
            &self.ctx,
            &frame.view_transform,
            &frame.positions,
            &mut self.scratch.ranges,
        );

        // Stage 2: per-point acoustic return intensity.
        intensity::compute_intensities(
            &self.ctx,
            &frame.view_transform,
            &frame.positions,
            &frame.normals,
            &frame.semantics,
            &self.scratch.reflectivity_lut,
            self.config.attenuation,
            &mut self.scratch.intensities,
        );

        // Stage 3: scatter-reduce into range bins. The accumulator must be
        // zeroed first and the dispatch must fully complete before the sums
        // are read back.
        self.scratch.bins.reset();
        binning::bin_points(
            &self.ctx,
            &self.grid,
            &self.scratch.ranges,
            &self.scratch.intensities,
            &self.scratch.bins,
        );
        self.dropped_last_tick = self.scratch.bins.dropped();
        self.scratch
            .bins
            .snapshot_into(&mut self.scratch.bin_sums, &mut self.scratch.bin_counts);

        // Stage 4: per-bin noise fields, seeded by the tick counter.
        noise::gaussian_field(
            &self.ctx,
            self.tick,
            &self.gaussian_dist,
            &mut self.scratch.gaussian_noise,
        );
        noise::range_rayleigh_field(
            &self.ctx,
            self.tick,
            &self.bin_ranges,
            self.config.max_range,
            self.config.rayleigh_noise_scale,
            &mut self.scratch.rayleigh_noise,
        );

        // Stage 5: max reduction, then normalization and composition.
        compose::reduce_max_intensity(
            &self.ctx,
            &self.scratch.bin_sums,
            &self.scratch.max_intensity,
        );
        compose::compose_profile(
            &self.ctx,
            &self.bin_ranges,
            &self.scratch.bin_sums,
            &self.scratch.max_intensity,
            &self.scratch.gaussian_noise,
            &self.scratch.rayleigh_noise,
            self.config.intensity_offset,
            self.config.intensity_gain,
            &mut self.profile,
        );
        compose::bin_averages(
            &self.ctx,
            &self.scratch.bin_sums,
            &self.scratch.bin_counts,
            &mut self.averages,
        );

        // Stage 6: rasterize and scroll the waterfall.
        waterfall::rasterize_row(&self.profile, &mut self.scratch.row);
        self.waterfall.push_row(&self.scratch.row);

        Ok(true)
    }

    /// The current sonar profile, one `(range, 0, intensity)` sample per bin.
    pub fn profile(&self) -> &[ProfileSample] {
        &self.profile
    }

    /// Noise-free per-bin averages from the diagnostic path.
    pub fn bin_averages(&self) -> &[f32] {
        &self.averages
    }

    /// The most recently rasterized grayscale RGBA row.
    pub fn scan_row(&self) -> &[u8] {
        &self.scratch.row
    }

    /// The full waterfall history buffer.
    pub fn waterfall(&self) -> &Waterfall {
        &self.waterfall
    }

    /// Points dropped by the coverage filter during the last successful scan.
    pub fn dropped_point_count(&self) -> u32 {
        self.dropped_last_tick
    }

    pub fn grid(&self) -> &SonarGrid {
        &self.grid
    }

    /// Configured operating window as `[min_range, max_range]` in meters.
    pub fn range(&self) -> [f32; 2] {
        [self.config.min_range, self.config.max_range]
    }

    pub fn config(&self) -> &SideScanSonarConfig {
        &self.config
    }

    /// Frames seen so far, including skipped ones. Doubles as the noise seed.
    pub fn tick(&self) -> u64 {
        self.tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LabelProperties, SemanticLabelTable};
    use approx::assert_relative_eq;
    use nalgebra::{Matrix4, Point3, Vector3};

    fn labels() -> SemanticLabelTable {
        let mut table = SemanticLabelTable::new();
        table.insert(
            0,
            LabelProperties {
                class: "BACKGROUND".into(),
                reflectivity: None,
            },
        );
        table.insert(
            1,
            LabelProperties {
                class: "UNLABELLED".into(),
                reflectivity: None,
            },
        );
        table.insert(
            2,
            LabelProperties {
                class: "seabed".into(),
                reflectivity: Some(0.7),
            },
        );
        table
    }

    fn test_config() -> SideScanSonarConfig {
        SideScanSonarConfig {
            min_range: 1.0,
            max_range: 5.0,
            range_resolution: 0.5,
            attenuation: 0.0,
            gaussian_noise_stddev: 0.0,
            rayleigh_noise_scale: 0.0,
            waterfall_height: 4,
            ..SideScanSonarConfig::default()
        }
    }

    /// Points straight ahead of a sensor at the origin, normals facing back.
    fn frame_with_points(ranges: &[f32]) -> ScanFrame {
        ScanFrame {
            positions: ranges.iter().map(|r| Point3::new(*r, 0.0, 0.0)).collect(),
            normals: vec![Vector3::new(-1.0, 0.0, 0.0); ranges.len()],
            semantics: vec![2; ranges.len()],
            view_transform: Matrix4::identity(),
            labels: labels(),
        }
    }

    #[test]
    fn rejects_bad_configuration_up_front() {
        let ctx = || ComputeContext::new().unwrap();

        let mut config = test_config();
        config.min_range = 0.0;
        assert!(matches!(
            SideScanSonar::new(config, ctx()),
            Err(SonarError::NonPositiveMinRange(_))
        ));

        let mut config = test_config();
        config.max_range = config.min_range;
        assert!(matches!(
            SideScanSonar::new(config, ctx()),
            Err(SonarError::InvalidRangeWindow { .. })
        ));

        let mut config = test_config();
        config.gaussian_noise_stddev = -0.1;
        assert!(matches!(
            SideScanSonar::new(config, ctx()),
            Err(SonarError::InvalidNoiseParameter(_))
        ));

        let mut config = test_config();
        config.waterfall_height = 0;
        assert!(matches!(
            SideScanSonar::new(config, ctx()),
            Err(SonarError::InvalidWaterfallHeight)
        ));
    }

    #[test]
    fn bin_count_covers_the_window() {
        let sonar = SideScanSonar::new(test_config(), ComputeContext::new().unwrap()).unwrap();
        assert_eq!(sonar.grid().bin_count(), 8);
        assert_eq!(sonar.profile().len(), 8);
        assert_eq!(sonar.range(), [1.0, 5.0]);
    }

    #[test]
    fn empty_label_table_skips_the_tick_entirely() {
        let mut sonar = SideScanSonar::new(test_config(), ComputeContext::new().unwrap()).unwrap();

        // Seed the waterfall with one real scan first.
        assert!(sonar.scan(&frame_with_points(&[2.0, 3.0])).unwrap());
        let before = sonar.waterfall().as_bytes().to_vec();
        let averages_before = sonar.bin_averages().to_vec();

        let mut empty = frame_with_points(&[2.0, 3.0]);
        empty.labels = SemanticLabelTable::new();
        assert!(!sonar.scan(&empty).unwrap());

        assert_eq!(sonar.waterfall().as_bytes(), before.as_slice());
        assert_eq!(sonar.bin_averages(), averages_before.as_slice());
        // The tick counter still advanced.
        assert_eq!(sonar.tick(), 2);
    }

    #[test]
    fn empty_point_cloud_skips_the_tick() {
        let mut sonar = SideScanSonar::new(test_config(), ComputeContext::new().unwrap()).unwrap();
        let frame = frame_with_points(&[]);
        assert!(!sonar.scan(&frame).unwrap());
    }

    #[test]
    fn nan_point_is_excluded_without_failing_the_scan() {
        let mut sonar = SideScanSonar::new(test_config(), ComputeContext::new().unwrap()).unwrap();
        let mut frame = frame_with_points(&[2.0, 3.0]);
        frame.positions.push(Point3::new(f32::NAN, 0.0, 0.0));
        frame.normals.push(Vector3::new(-1.0, 0.0, 0.0));
        frame.semantics.push(2);

        assert!(sonar.scan(&frame).unwrap());
        assert_eq!(sonar.dropped_point_count(), 1);

        // Both valid points landed; bins hold one hit each.
        let hits: u32 = (0..sonar.grid().bin_count())
            .map(|i| sonar.scratch.bins.count(i))
            .sum();
        assert_eq!(hits, 2);
    }

    #[test]
    fn average_identity_and_conservation_end_to_end() {
        let mut sonar = SideScanSonar::new(test_config(), ComputeContext::new().unwrap()).unwrap();
        // Two points in the 2.0 bin, one in the 3.0 bin, one out of range.
        let frame = frame_with_points(&[2.1, 2.2, 3.1, 9.0]);
        assert!(sonar.scan(&frame).unwrap());
        assert_eq!(sonar.dropped_point_count(), 1);

        // attenuation = 0 and head-on normals give every point intensity 0.7.
        let bin_2 = sonar.grid().bin_index(2.1).unwrap();
        let bin_3 = sonar.grid().bin_index(3.1).unwrap();
        assert_relative_eq!(sonar.bin_averages()[bin_2], 0.7, epsilon = 1e-5);
        assert_relative_eq!(sonar.bin_averages()[bin_3], 0.7, epsilon = 1e-5);
    }

    #[test]
    fn profile_stays_within_display_bounds() {
        let mut config = test_config();
        config.gaussian_noise_stddev = 5.0;
        config.rayleigh_noise_scale = 5.0;
        config.intensity_gain = 10.0;
        let mut sonar = SideScanSonar::new(config, ComputeContext::new().unwrap()).unwrap();

        assert!(sonar.scan(&frame_with_points(&[2.0, 3.0, 4.0])).unwrap());
        for sample in sonar.profile() {
            assert!((0.0..=1.0).contains(&sample.intensity));
            assert_eq!(sample.azimuth, 0.0);
        }
    }

    #[test]
    fn pipeline_is_deterministic_given_seed() {
        // Single-worker contexts so float scatter-add order is fixed.
        let mut a =
            SideScanSonar::new(test_config(), ComputeContext::with_threads(1).unwrap()).unwrap();
        let mut b =
            SideScanSonar::new(test_config(), ComputeContext::with_threads(1).unwrap()).unwrap();

        let frame = frame_with_points(&[1.5, 2.0, 2.5, 3.0, 4.4]);
        assert!(a.scan(&frame).unwrap());
        assert!(b.scan(&frame).unwrap());

        assert_eq!(a.profile(), b.profile());
        assert_eq!(a.bin_averages(), b.bin_averages());
        assert_eq!(a.scan_row(), b.scan_row());
    }

    #[test]
    fn successive_ticks_draw_different_noise() {
        let mut config = test_config();
        config.gaussian_noise_stddev = 0.05;
        let mut sonar = SideScanSonar::new(config, ComputeContext::new().unwrap()).unwrap();

        let frame = frame_with_points(&[2.0, 3.0]);
        assert!(sonar.scan(&frame).unwrap());
        let first = sonar.profile().to_vec();
        assert!(sonar.scan(&frame).unwrap());
        assert_ne!(first.as_slice(), sonar.profile());
    }

    #[test]
    fn waterfall_scrolls_newest_first() {
        let mut sonar = SideScanSonar::new(test_config(), ComputeContext::new().unwrap()).unwrap();
        let frame = frame_with_points(&[2.0]);

        assert!(sonar.scan(&frame).unwrap());
        let first_row = sonar.scan_row().to_vec();
        assert_eq!(sonar.waterfall().row(0), first_row.as_slice());

        assert!(sonar.scan(&frame).unwrap());
        assert_eq!(sonar.waterfall().row(1), first_row.as_slice());
        assert_eq!(sonar.waterfall().row(0), sonar.scan_row());
    }

    #[test]
    fn normalizing_methods_agree_on_the_1d_profile() {
        let frame = frame_with_points(&[1.5, 2.0, 2.5, 3.0]);

        let mut all_config = test_config();
        all_config.normalizing_method = NormalizingMethod::All;
        let mut range_config = test_config();
        range_config.normalizing_method = NormalizingMethod::Range;

        let mut all_sonar =
            SideScanSonar::new(all_config, ComputeContext::with_threads(1).unwrap()).unwrap();
        let mut range_sonar =
            SideScanSonar::new(range_config, ComputeContext::with_threads(1).unwrap()).unwrap();

        assert!(all_sonar.scan(&frame).unwrap());
        assert!(range_sonar.scan(&frame).unwrap());
        assert_eq!(all_sonar.profile(), range_sonar.profile());
    }
}
