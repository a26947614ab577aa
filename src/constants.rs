//! Constants used throughout the application

/// Number of landmarks per face with iris refinement: 468 mesh points plus 10 iris points
pub const NUM_FACE_LANDMARKS: usize = 478;

/// Number of landmarks per face from the bare face mesh
pub const NUM_FACE_MESH_LANDMARKS: usize = 468;

/// Landmark index of the nose bridge (overlay anchor)
pub const NOSE_BRIDGE_INDEX: usize = 6;

/// Landmark index of the left pupil (iris center)
pub const LEFT_PUPIL_INDEX: usize = 468;

/// Landmark index of the right pupil (iris center)
pub const RIGHT_PUPIL_INDEX: usize = 473;

/// Landmark index of the top of the forehead
pub const FOREHEAD_TOP_INDEX: usize = 10;

/// Landmark index of the chin
pub const CHIN_INDEX: usize = 152;

/// Landmark indices of the outermost cheek points
pub const LEFT_CHEEK_INDEX: usize = 234;
pub const RIGHT_CHEEK_INDEX: usize = 454;

/// Landmark indices of the jaw angles
pub const LEFT_JAW_INDEX: usize = 172;
pub const RIGHT_JAW_INDEX: usize = 397;

/// Landmark indices of the temples at forehead height
pub const LEFT_FOREHEAD_INDEX: usize = 54;
pub const RIGHT_FOREHEAD_INDEX: usize = 284;

/// Number of elements in a flattened 4x4 transformation matrix
pub const TRANSFORM_MATRIX_LEN: usize = 16;

/// Normalized interpupillary distance at which the model's authored scale is correct
pub const DEFAULT_REFERENCE_IPD: f64 = 0.05;

/// Scale applied before the first frame with visible pupils
pub const INITIAL_OVERLAY_SCALE: f64 = 1.0;

/// Normalized coordinate of the frame center on both axes
pub const NORMALIZED_CENTER: f64 = 0.5;

/// Adult population mean interpupillary distance, used as a physical ruler
pub const AVERAGE_IPD_MM: f64 = 63.0;

/// Fit score bounds and the neutral score used when nothing can be measured
pub const FIT_SCORE_MIN: u8 = 0;
pub const FIT_SCORE_MAX: u8 = 100;
pub const FIT_SCORE_NEUTRAL: u8 = 50;

/// Fit badge thresholds
pub const FIT_GOOD_THRESHOLD: u8 = 80;
pub const FIT_OK_THRESHOLD: u8 = 50;

/// Default fit rule parameters
pub const DEFAULT_WIDTH_TOLERANCE_MM: f64 = 4.0;
pub const DEFAULT_WIDTH_PENALTY_PER_MM: f64 = 3.0;
pub const DEFAULT_SHAPE_PENALTY: f64 = 15.0;

/// Default display parameters
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 720;
pub const DEFAULT_FPS: f64 = 30.0;

/// Default smoothing parameters
pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 5;
pub const DEFAULT_MEDIAN_WINDOW: usize = 5;
pub const DEFAULT_EXPONENTIAL_ALPHA: f64 = 0.5;

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-10;
