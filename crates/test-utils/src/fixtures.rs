//! Fixtures for the canonical scenarios used across the test suites.

/// The 4x4 ramp scenario: values 0..15 row-major on a coarse global grid.
pub mod ramp {
    pub const WIDTH: usize = 4;
    pub const HEIGHT: usize = 4;
    pub const LON: [f64; 4] = [0.0, 90.0, 180.0, 270.0];
    pub const LAT: [f64; 4] = [-60.0, -20.0, 20.0, 60.0];
    /// Separates 0..=7 from 8..=15.
    pub const MID_LEVEL: f64 = 7.5;
}

/// Extents as `[west, east, south, north]`.
pub mod extent {
    /// Whole globe on the -180..180 convention.
    pub const GLOBAL: [f64; 4] = [-180.0, 180.0, -90.0, 90.0];

    /// Pacific box crossing the antimeridian, in absolute degrees.
    pub const PACIFIC: [f64; 4] = [150.0, 240.0, -30.0, 30.0];

    /// The AOD example of the command-line documentation.
    pub const AOD_EXAMPLE: [f64; 4] = [-120.0, 240.0, -80.0, 80.0];

    /// Entirely north of the pole: selects nothing.
    pub const BEYOND_POLE: [f64; 4] = [0.0, 10.0, 95.0, 99.0];
}

/// GEOS-CF collections the tool is usually pointed at.
pub mod geos_cf {
    /// 0.25 degree global grid.
    pub const WIDTH: usize = 1440;
    pub const HEIGHT: usize = 721;

    pub const CHM_URL: &str =
        "https://opendap.nccs.nasa.gov/dods/gmao/geos-cf/assim/chm_tavg_1hr_g1440x721_v1";

    pub const AOD_VARIABLES: [&str; 6] = [
        "aod550_dust",
        "aod550_sala",
        "aod550_salc",
        "aod550_oc",
        "aod550_bc",
        "aod550_sulfate",
    ];
}
