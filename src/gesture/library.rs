//! Gesture Library
//!
//! Static gesture definitions: ordered checkpoints per gesture plus the
//! mutual-exclusion groups that keep opposite gestures from co-firing.

use super::predicate::Predicate;
use crate::pose::features::{Feature, JointAngle, PlanarAngle};
use crate::pose::landmarks::LandmarkName;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Gesture category; selects the auto-release interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    /// Quick tap
    Click,
    /// Sustained while the pose is held
    Hold,
    /// Arm swing mapped to a mouse button
    HandSwing,
    /// Head turn mapped to mouse motion
    FaceDirection,
    /// Fire-and-forget scroll tick
    Scroll,
}

impl GestureKind {
    pub const ALL: [GestureKind; 5] = [
        GestureKind::Click,
        GestureKind::Hold,
        GestureKind::HandSwing,
        GestureKind::FaceDirection,
        GestureKind::Scroll,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Hold => "hold",
            Self::HandSwing => "hand_swing",
            Self::FaceDirection => "face_direction",
            Self::Scroll => "scroll",
        }
    }
}

impl std::fmt::Display for GestureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// One latchable step of a gesture
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointSpec {
    pub predicate: Predicate,
    /// How long the checkpoint stays latched after its predicate was last true
    pub decay_window: Duration,
}

impl CheckpointSpec {
    /// A checkpoint that must hold in the evaluated frame itself
    pub fn instant(predicate: Predicate) -> Self {
        Self {
            predicate,
            decay_window: Duration::ZERO,
        }
    }

    /// A checkpoint that stays latched for `decay_window` after it was last true
    pub fn lasting(predicate: Predicate, decay_window: Duration) -> Self {
        Self {
            predicate,
            decay_window,
        }
    }
}

/// A named gesture: every checkpoint latched at once fires it
#[derive(Debug, Clone, PartialEq)]
pub struct GestureDefinition {
    pub name: String,
    pub description: String,
    pub kind: GestureKind,
    pub checkpoints: Vec<CheckpointSpec>,
}

impl GestureDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        kind: GestureKind,
        checkpoints: Vec<CheckpointSpec>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            checkpoints,
        }
    }
}

/// Gestures that must not fire in the same frame
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionGroup {
    pub members: Vec<String>,
    /// Optional cross-frame hold-off applied to the other members after one fires
    pub hold_off: Option<Duration>,
}

impl ExclusionGroup {
    pub fn new(members: &[&str], hold_off: Option<Duration>) -> Self {
        Self {
            members: members.iter().map(|m| m.to_string()).collect(),
            hold_off,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.iter().any(|m| m == name)
    }
}

/// Tunable thresholds for the standard library (degrees and milliseconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureThresholds {
    /// Decay window for non-terminal checkpoints
    pub default_checkpoint_decay_ms: u64,
    /// Decay window for the "hands down" step of jump
    pub jump_checkpoint_decay_ms: u64,
    /// Both elbows tighter than this for cross_hands
    pub elbow_cross_max_angle: f64,
    /// Both knees tighter than this for squat
    pub squat_knee_max_angle: f64,
    /// Either knee tighter than this counts as a walking step
    pub walk_knee_max_angle: f64,
    /// Foot direction range for walk_left
    pub direction_left_foot_min: f64,
    pub direction_left_foot_max: f64,
    /// Foot direction range for walk_right
    pub direction_right_foot_min: f64,
    pub direction_right_foot_max: f64,
    /// Head-turn magnitudes
    pub face_left_min: f64,
    pub face_right_min: f64,
    pub face_up_min: f64,
    pub face_down_min: f64,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            default_checkpoint_decay_ms: 300,
            jump_checkpoint_decay_ms: 800,
            elbow_cross_max_angle: 100.0,
            squat_knee_max_angle: 120.0,
            walk_knee_max_angle: 105.0,
            direction_left_foot_min: 0.0,
            direction_left_foot_max: 90.0,
            direction_right_foot_min: 90.0,
            direction_right_foot_max: 180.0,
            face_left_min: 9.0,
            face_right_min: 9.0,
            face_up_min: 13.0,
            face_down_min: 3.0,
        }
    }
}

/// Validated set of gestures and exclusion groups
#[derive(Debug, Clone)]
pub struct GestureLibrary {
    gestures: Vec<GestureDefinition>,
    groups: Vec<ExclusionGroup>,
}

impl GestureLibrary {
    /// Build a library, rejecting duplicate names, empty gestures and
    /// exclusion groups that reference unknown or already-grouped gestures.
    pub fn new(
        gestures: Vec<GestureDefinition>,
        groups: Vec<ExclusionGroup>,
    ) -> Result<Self, crate::Error> {
        let mut names = HashSet::new();
        for gesture in &gestures {
            if gesture.name.trim().is_empty() {
                return Err(crate::Error::Library("gesture name must not be empty".into()));
            }
            if !names.insert(gesture.name.as_str()) {
                return Err(crate::Error::Library(format!(
                    "duplicate gesture '{}'",
                    gesture.name
                )));
            }
            if gesture.checkpoints.is_empty() {
                return Err(crate::Error::Library(format!(
                    "gesture '{}' has no checkpoints",
                    gesture.name
                )));
            }
        }

        let mut grouped = HashSet::new();
        for group in &groups {
            for member in &group.members {
                if !names.contains(member.as_str()) {
                    return Err(crate::Error::Library(format!(
                        "exclusion group references unknown gesture '{}'",
                        member
                    )));
                }
                if !grouped.insert(member.as_str()) {
                    return Err(crate::Error::Library(format!(
                        "gesture '{}' belongs to more than one exclusion group",
                        member
                    )));
                }
            }
        }

        Ok(Self { gestures, groups })
    }

    /// The built-in gesture set
    pub fn standard(thresholds: &GestureThresholds) -> Self {
        let gestures = standard_gestures(thresholds);
        let groups = standard_groups();
        Self { gestures, groups }
    }

    /// Definitions, in evaluation order
    pub fn gestures(&self) -> &[GestureDefinition] {
        &self.gestures
    }

    pub fn groups(&self) -> &[ExclusionGroup] {
        &self.groups
    }

    pub fn get(&self, name: &str) -> Option<&GestureDefinition> {
        self.gestures.iter().find(|g| g.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The exclusion group a gesture belongs to, if any
    pub fn group_of(&self, name: &str) -> Option<&ExclusionGroup> {
        self.groups.iter().find(|g| g.contains(name))
    }

    pub fn len(&self) -> usize {
        self.gestures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gestures.is_empty()
    }
}

impl Default for GestureLibrary {
    fn default() -> Self {
        Self::standard(&GestureThresholds::default())
    }
}

fn x(lm: LandmarkName) -> Feature {
    Feature::x(lm)
}

fn y(lm: LandmarkName) -> Feature {
    Feature::y(lm)
}

/// One knee raised while both knees stay below the hips
fn walking(t: &GestureThresholds) -> Predicate {
    use LandmarkName::*;
    Predicate::all([
        Predicate::any([
            Predicate::lt(Feature::Angle(JointAngle::LeftKnee), t.walk_knee_max_angle),
            Predicate::lt(Feature::Angle(JointAngle::RightKnee), t.walk_knee_max_angle),
        ]),
        Predicate::gt(y(LeftKnee), y(LeftHip)),
        Predicate::gt(y(RightKnee), y(RightHip)),
    ])
}

fn feet_within(min: f64, max: f64) -> Predicate {
    Predicate::all([
        Predicate::in_range(Feature::PlanarAngle(PlanarAngle::LeftFoot), min, max),
        Predicate::in_range(Feature::PlanarAngle(PlanarAngle::RightFoot), min, max),
    ])
}

fn standard_gestures(t: &GestureThresholds) -> Vec<GestureDefinition> {
    use GestureKind::*;
    use LandmarkName::*;

    let decay = Duration::from_millis(t.default_checkpoint_decay_ms);
    let jump_decay = Duration::from_millis(t.jump_checkpoint_decay_ms);

    let hands_down = Predicate::all([
        Predicate::gt(y(LeftWrist), y(LeftShoulder)),
        Predicate::gt(y(RightWrist), y(RightShoulder)),
    ]);

    vec![
        GestureDefinition::new(
            "jump",
            "Raise both hands up, higher than the head.",
            Click,
            vec![
                CheckpointSpec::lasting(hands_down.clone(), jump_decay),
                CheckpointSpec::instant(Predicate::all([
                    Predicate::lt(y(LeftWrist), y(Nose)),
                    Predicate::lt(y(RightWrist), y(Nose)),
                ])),
            ],
        ),
        GestureDefinition::new(
            "cross_hands",
            "Cross both hands in front of the body.",
            Click,
            vec![CheckpointSpec::instant(Predicate::all([
                Predicate::lt(x(LeftWrist), x(RightWrist)),
                Predicate::lt(Feature::Angle(JointAngle::LeftElbow), t.elbow_cross_max_angle),
                Predicate::lt(Feature::Angle(JointAngle::RightElbow), t.elbow_cross_max_angle),
            ]))],
        ),
        GestureDefinition::new(
            "left_swing",
            "Swing the left hand from above the shoulder down to the side.",
            HandSwing,
            vec![
                CheckpointSpec::lasting(
                    Predicate::all([
                        Predicate::lt(y(LeftWrist), y(LeftShoulder)),
                        Predicate::gt(x(LeftWrist), x(LeftShoulder)),
                        Predicate::gt(y(RightWrist), y(RightShoulder)),
                    ]),
                    decay,
                ),
                CheckpointSpec::instant(hands_down.clone()),
            ],
        ),
        GestureDefinition::new(
            "right_swing",
            "Swing the right hand from above the shoulder down to the side.",
            HandSwing,
            vec![
                CheckpointSpec::lasting(
                    Predicate::all([
                        Predicate::lt(y(RightWrist), y(RightShoulder)),
                        Predicate::lt(x(RightWrist), x(RightShoulder)),
                        Predicate::gt(y(LeftWrist), y(LeftShoulder)),
                    ]),
                    decay,
                ),
                CheckpointSpec::instant(hands_down),
            ],
        ),
        GestureDefinition::new(
            "left_hand_right",
            "Sweep the left hand across the body to the right side.",
            Scroll,
            vec![CheckpointSpec::instant(Predicate::lt(
                x(LeftWrist),
                x(RightShoulder),
            ))],
        ),
        GestureDefinition::new(
            "right_hand_left",
            "Sweep the right hand across the body to the left side.",
            Scroll,
            vec![CheckpointSpec::instant(Predicate::gt(
                x(RightWrist),
                x(LeftShoulder),
            ))],
        ),
        GestureDefinition::new(
            "face_left",
            "Turn the head to the left.",
            FaceDirection,
            vec![CheckpointSpec::instant(Predicate::gt(
                Feature::FaceDirectionY,
                t.face_left_min,
            ))],
        ),
        GestureDefinition::new(
            "face_right",
            "Turn the head to the right.",
            FaceDirection,
            vec![CheckpointSpec::instant(Predicate::lt(
                Feature::FaceDirectionY,
                -t.face_right_min,
            ))],
        ),
        GestureDefinition::new(
            "face_up",
            "Tilt the head up.",
            FaceDirection,
            vec![CheckpointSpec::instant(Predicate::gt(
                Feature::FaceDirectionX,
                t.face_up_min,
            ))],
        ),
        GestureDefinition::new(
            "face_down",
            "Tilt the head down.",
            FaceDirection,
            vec![CheckpointSpec::instant(Predicate::lt(
                Feature::FaceDirectionX,
                -t.face_down_min,
            ))],
        ),
        GestureDefinition::new(
            "squat",
            "Bend both knees.",
            Hold,
            vec![CheckpointSpec::instant(Predicate::all([
                Predicate::lt(Feature::Angle(JointAngle::LeftKnee), t.squat_knee_max_angle),
                Predicate::lt(Feature::Angle(JointAngle::RightKnee), t.squat_knee_max_angle),
            ]))],
        ),
        GestureDefinition::new(
            "walk_left",
            "Walk in place with both feet pointing left.",
            Hold,
            vec![CheckpointSpec::instant(Predicate::all([
                walking(t),
                feet_within(t.direction_left_foot_min, t.direction_left_foot_max),
            ]))],
        ),
        GestureDefinition::new(
            "walk_right",
            "Walk in place with both feet pointing right.",
            Hold,
            vec![CheckpointSpec::instant(Predicate::all([
                walking(t),
                feet_within(t.direction_right_foot_min, t.direction_right_foot_max),
            ]))],
        ),
        GestureDefinition::new(
            "walk_backward",
            "Walk in place with the feet wider than the shoulders.",
            Hold,
            vec![CheckpointSpec::instant(Predicate::all([
                walking(t),
                Predicate::gt(x(LeftAnkle), x(LeftShoulder)),
                Predicate::lt(x(RightAnkle), x(RightShoulder)),
            ]))],
        ),
        GestureDefinition::new(
            "walk_forward",
            "Walk in place.",
            Hold,
            vec![CheckpointSpec::instant(walking(t))],
        ),
    ]
}

fn standard_groups() -> Vec<ExclusionGroup> {
    vec![
        ExclusionGroup::new(
            &["left_hand_right", "right_hand_left"],
            Some(Duration::from_millis(1000)),
        ),
        ExclusionGroup::new(&["jump", "cross_hands"], Some(Duration::from_millis(200))),
        ExclusionGroup::new(&["left_swing", "right_swing"], Some(Duration::from_millis(200))),
        ExclusionGroup::new(&["face_left", "face_right", "face_up", "face_down"], None),
        ExclusionGroup::new(
            &["squat", "walk_forward", "walk_left", "walk_right", "walk_backward"],
            None,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_library_is_valid() {
        let lib = GestureLibrary::default();
        let rebuilt = GestureLibrary::new(lib.gestures().to_vec(), lib.groups().to_vec());
        assert!(rebuilt.is_ok());
        assert_eq!(lib.len(), 15);
    }

    #[test]
    fn test_multi_step_gestures_carry_decay() {
        let lib = GestureLibrary::default();
        let jump = lib.get("jump").unwrap();
        assert_eq!(jump.checkpoints.len(), 2);
        assert_eq!(jump.checkpoints[0].decay_window, Duration::from_millis(800));
        assert_eq!(jump.checkpoints[1].decay_window, Duration::ZERO);

        let swing = lib.get("left_swing").unwrap();
        assert_eq!(swing.checkpoints[0].decay_window, Duration::from_millis(300));
    }

    #[test]
    fn test_thresholds_flow_into_predicates() {
        let thresholds = GestureThresholds {
            face_left_min: 20.0,
            ..Default::default()
        };
        let lib = GestureLibrary::standard(&thresholds);
        let face_left = lib.get("face_left").unwrap();
        assert_eq!(
            face_left.checkpoints[0].predicate,
            Predicate::gt(Feature::FaceDirectionY, 20.0)
        );
    }

    #[test]
    fn test_group_lookup() {
        let lib = GestureLibrary::default();
        let group = lib.group_of("left_swing").unwrap();
        assert!(group.contains("right_swing"));
        assert_eq!(group.hold_off, Some(Duration::from_millis(200)));
        assert!(lib.group_of("unknown").is_none());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let g = GestureDefinition::new(
            "a",
            "",
            GestureKind::Click,
            vec![CheckpointSpec::instant(Predicate::all([]))],
        );
        let result = GestureLibrary::new(vec![g.clone(), g], vec![]);
        assert!(matches!(result, Err(crate::Error::Library(_))));
    }

    #[test]
    fn test_empty_checkpoints_rejected() {
        let g = GestureDefinition::new("a", "", GestureKind::Click, vec![]);
        assert!(GestureLibrary::new(vec![g], vec![]).is_err());
    }

    #[test]
    fn test_unknown_group_member_rejected() {
        let g = GestureDefinition::new(
            "a",
            "",
            GestureKind::Click,
            vec![CheckpointSpec::instant(Predicate::all([]))],
        );
        let group = ExclusionGroup::new(&["a", "b"], None);
        assert!(GestureLibrary::new(vec![g], vec![group]).is_err());
    }

    #[test]
    fn test_member_in_two_groups_rejected() {
        let make = |name: &str| {
            GestureDefinition::new(
                name,
                "",
                GestureKind::Click,
                vec![CheckpointSpec::instant(Predicate::all([]))],
            )
        };
        let groups = vec![
            ExclusionGroup::new(&["a", "b"], None),
            ExclusionGroup::new(&["b", "c"], None),
        ];
        assert!(GestureLibrary::new(vec![make("a"), make("b"), make("c")], groups).is_err());
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&GestureKind::HandSwing).unwrap();
        assert_eq!(json, "\"hand_swing\"");
        assert_eq!(GestureKind::FaceDirection.to_string(), "face_direction");
    }
}
