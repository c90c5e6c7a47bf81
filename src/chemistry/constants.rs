// Source: http://pdg.lbl.gov/2012/reviews/rpp2012-rev-phys-constants.pdf
pub const AVERAGE_AA_MASS: f64 = 111.1254;

pub const HYDROGEN_MONO_MASS: f64 = 1.00782503207;
pub const HYDROGEN_AVERAGE_MASS: f64 = 1.00794;

pub const HYDROXYL_MONO_MASS: f64 = 17.00273965163;
pub const HYDROXYL_AVERAGE_MASS: f64 = 17.00734;

pub const WATER_MONO_MASS: f64 = 18.010565;
pub const WATER_AVERAGE_MASS: f64 = 18.01525697318;

/// Name given in the catalog to the zero-mass "no modification" placeholder.
pub const UNMODIFIED_NAME: &str = "unmodified";
