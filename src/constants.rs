//! Constants used throughout the application

/// Face mesh index of the upper inner lip midpoint
pub const UPPER_LIP_INDEX: usize = 13;

/// Face mesh index of the lower inner lip midpoint
pub const LOWER_LIP_INDEX: usize = 14;

/// Face mesh index of the left mouth corner
pub const LEFT_MOUTH_CORNER_INDEX: usize = 61;

/// Face mesh index of the right mouth corner
pub const RIGHT_MOUTH_CORNER_INDEX: usize = 291;

/// Landmarks used for lip features, in bounding-box order
pub const MOUTH_LANDMARKS: [usize; 4] = [
    LEFT_MOUTH_CORNER_INDEX,
    RIGHT_MOUTH_CORNER_INDEX,
    UPPER_LIP_INDEX,
    LOWER_LIP_INDEX,
];

/// Number of points produced by the face mesh model
pub const NUM_FACE_MESH_LANDMARKS: usize = 468;

/// Guard for the mouth-width denominator
pub const OPENNESS_EPSILON: f64 = 1e-6;

/// Rolling openness history capacity
pub const DEFAULT_HISTORY_CAPACITY: usize = 30;

/// Samples required before a sequence is scored
pub const DEFAULT_MIN_SEQUENCE_LENGTH: usize = 10;

/// Minimum seconds between two lip-reading emissions
pub const DEFAULT_WORD_COOLDOWN_SECS: f64 = 2.0;

/// Templates scoring at or below this never become the running best
pub const DEFAULT_SCORING_FLOOR: f64 = 0.6;

/// Candidates must score above this to be emitted
pub const DEFAULT_EMISSION_THRESHOLD: f64 = 0.65;

/// Scoring weights: openness, movement, temporal pattern
pub const OPENNESS_WEIGHT: f64 = 0.4;
pub const MOVEMENT_WEIGHT: f64 = 0.3;
pub const PATTERN_WEIGHT: f64 = 0.3;

/// Denominator padding for the openness and movement similarity terms
pub const OPENNESS_SCORE_PADDING: f64 = 0.1;
pub const MOVEMENT_SCORE_PADDING: f64 = 0.05;

/// Pattern score used when the sequence cannot be split in thirds
pub const SHORT_SEQUENCE_PATTERN_SCORE: f64 = 0.5;

/// Default sign detector confidence threshold
pub const DEFAULT_SIGN_CONFIDENCE: f32 = 0.65;

/// Bounds for user-adjusted sign confidence
pub const SIGN_CONFIDENCE_MIN: f32 = 0.3;
pub const SIGN_CONFIDENCE_MAX: f32 = 0.95;

/// Minimum seconds between two appended signs
pub const DEFAULT_SIGN_COOLDOWN_SECS: f64 = 1.5;

/// Side length of the square frames compared by the motion heuristic
pub const MOTION_FRAME_SIZE: u32 = 96;

/// Default history listing limit
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Date format stored alongside history timestamps
pub const HISTORY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
