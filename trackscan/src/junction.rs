//! Annotates a path through a skeleton with junction and turn tokens.
//!
//! A window of four consecutive path points is slid along the path. The direction of the
//! first and of the last segment gives the turn, and a strip of five sensor cells laid
//! across the direction of travel is compared against the registered junction signatures.

use std::{f64::consts::PI, fmt::Display, ops::Deref, str::FromStr};

use log::{debug, trace};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::grid::{BinaryGrid, Point};

/// Number of cells in a sensor strip
pub const SENSOR_WIDTH: usize = 5;

/// Points in one classification window
pub const WINDOW: usize = 4;

const ANGLE_EPSILON: f64 = 1e-9;

/// Sensor values from the left of the direction of travel to its right
pub type SensorReading = [u8; SENSOR_WIDTH];

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Turn {
    Forward,
    Left,
    Right,
}

impl Turn {
    /// 0 is forward, -90 is left and +90 is right, any other angle is not a turn
    pub fn from_angle(degrees: f64) -> Option<Turn> {
        if degrees.abs() < ANGLE_EPSILON {
            Some(Turn::Forward)
        } else if (degrees + 90.0).abs() < ANGLE_EPSILON {
            Some(Turn::Left)
        } else if (degrees - 90.0).abs() < ANGLE_EPSILON {
            Some(Turn::Right)
        } else {
            None
        }
    }
}

impl Display for Turn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Turn::Forward => "forward",
                Turn::Left => "left",
                Turn::Right => "right",
            }
        )
    }
}

impl FromStr for Turn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "forward" => Ok(Turn::Forward),
            "left" => Ok(Turn::Left),
            "right" => Ok(Turn::Right),
            _ => Err(Error::UnknownTurn(s.to_string())),
        }
    }
}

/// A named sensor pattern identifying a junction shape
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JunctionSignature {
    pub name: String,
    pub pattern: SensorReading,
}

impl JunctionSignature {
    pub fn new(name: impl Into<String>, pattern: SensorReading) -> Result<Self> {
        let name = name.into();
        if let Some(value) = pattern.iter().find(|&&v| v > 1) {
            return Err(Error::InvalidSignature {
                name,
                reason: format!("pattern value {} is not 0 or 1", value),
            });
        }
        Ok(Self { name, pattern })
    }
}

/// Ordered set of junction signatures, the first registered match wins
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "Vec<JunctionSignature>",
    into = "Vec<JunctionSignature>"
)]
pub struct JunctionRegistry {
    signatures: Vec<JunctionSignature>,
}

impl JunctionRegistry {
    /// A registry without any signature
    pub fn empty() -> Self {
        Self {
            signatures: Vec::new(),
        }
    }

    /// Add a signature at the end, or replace the pattern of an existing name in place
    pub fn register(&mut self, name: impl Into<String>, pattern: SensorReading) -> Result<()> {
        let signature = JunctionSignature::new(name, pattern)?;
        match self
            .signatures
            .iter_mut()
            .find(|s| s.name == signature.name)
        {
            Some(existing) => existing.pattern = signature.pattern,
            None => self.signatures.push(signature),
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&SensorReading> {
        self.signatures
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.pattern)
    }

    pub fn iter(&self) -> impl Iterator<Item = &JunctionSignature> {
        self.signatures.iter()
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Name of the first signature equal to `reading` in every position
    pub fn match_reading(&self, reading: &SensorReading) -> Option<&str> {
        self.signatures
            .iter()
            .find(|s| &s.pattern == reading)
            .map(|s| s.name.as_str())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for JunctionRegistry {
    fn default() -> Self {
        Self {
            signatures: vec![
                JunctionSignature {
                    name: "leftTack".to_string(),
                    pattern: [1, 1, 1, 0, 0],
                },
                JunctionSignature {
                    name: "rightTack".to_string(),
                    pattern: [0, 0, 1, 1, 1],
                },
                JunctionSignature {
                    name: "cross".to_string(),
                    pattern: [1, 1, 1, 1, 1],
                },
            ],
        }
    }
}

impl TryFrom<Vec<JunctionSignature>> for JunctionRegistry {
    type Error = Error;

    fn try_from(signatures: Vec<JunctionSignature>) -> Result<Self> {
        let mut registry = JunctionRegistry::empty();
        for signature in signatures {
            registry.register(signature.name, signature.pattern)?;
        }
        Ok(registry)
    }
}

impl From<JunctionRegistry> for Vec<JunctionSignature> {
    fn from(registry: JunctionRegistry) -> Self {
        registry.signatures
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Token {
    Junction { name: String, turn: Turn },
    NoJunction,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Junction { name, turn } => write!(f, "{}:{}", name, turn),
            Token::NoJunction => write!(f, "-"),
        }
    }
}

/// Tokens in path order, consecutive [`Token::NoJunction`] markers are kept as one
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSequence(Vec<Token>);

impl TokenSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: Token) {
        if token == Token::NoJunction && self.0.last() == Some(&Token::NoJunction) {
            return;
        }
        self.0.push(token);
    }

    /// Junction tokens only
    pub fn junctions(&self) -> impl Iterator<Item = (&str, Turn)> {
        self.0.iter().filter_map(|t| match t {
            Token::Junction { name, turn } => Some((name.as_str(), *turn)),
            Token::NoJunction => None,
        })
    }

    pub fn into_inner(self) -> Vec<Token> {
        self.0
    }
}

impl Deref for TokenSequence {
    type Target = [Token];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<Token> for TokenSequence {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        let mut sequence = TokenSequence::new();
        for token in iter {
            sequence.push(token);
        }
        sequence
    }
}

impl Display for TokenSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, token) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}

/// Path points are widened so differences and anchors never overflow
fn to_vector(p: Point) -> Vector2<i64> {
    Vector2::new(p.x as i64, p.y as i64)
}

fn angle_between(u: &Vector2<i64>, w: &Vector2<i64>) -> f64 {
    let u = Vector2::new(u.x as i128, u.y as i128);
    let w = Vector2::new(w.x as i128, w.y as i128);
    let cross = u.perp(&w);
    let dot = u.dot(&w);
    (cross as f64).atan2(dot as f64) / PI * 180.0
}

/// Signed angle in degrees from `u` to `w`, positive when turning clockwise on screen
pub fn turn_angle(u: Point, w: Point) -> f64 {
    angle_between(&to_vector(u), &to_vector(w))
}

#[derive(Clone, Debug, Default)]
pub struct JunctionClassifier {
    registry: JunctionRegistry,
}

impl JunctionClassifier {
    pub fn new(registry: JunctionRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &JunctionRegistry {
        &self.registry
    }

    /// Read the five cells across `direction`, centred on `anchor`.
    ///
    /// The step between cells is `(-sign(dy), sign(dx))`, so the first value lies to the
    /// left of the direction of travel. Cells outside of the grid read as 0.
    pub fn sense(grid: &BinaryGrid, anchor: Point, direction: Point) -> SensorReading {
        Self::sense_at(grid, &to_vector(anchor), &to_vector(direction))
    }

    fn sense_at(
        grid: &BinaryGrid,
        anchor: &Vector2<i64>,
        direction: &Vector2<i64>,
    ) -> SensorReading {
        let step = Vector2::new(-direction.y.signum(), direction.x.signum());
        let half = (SENSOR_WIDTH / 2) as i64;

        let mut reading = [0; SENSOR_WIDTH];
        for (value, k) in reading.iter_mut().zip(-half..=half) {
            let cell = anchor + step * k;
            *value = grid.get(cell.x, cell.y);
        }
        reading
    }

    fn junction_at(
        &self,
        grid: &BinaryGrid,
        anchor: &Vector2<i64>,
        direction: &Vector2<i64>,
    ) -> Option<&str> {
        let reading = Self::sense_at(grid, anchor, direction);
        trace!("sensor at ({}, {}) reads {:?}", anchor.x, anchor.y, reading);
        self.registry.match_reading(&reading)
    }

    /// Token for the window `[p0, p1, p2, p3]`
    pub fn classify_window(&self, grid: &BinaryGrid, window: &[Point; WINDOW]) -> Token {
        let [p0, p1, p2, p3] = window.map(to_vector);
        let u = p1 - p0;
        let w = p3 - p2;

        // repeated points give no direction to lay the sensor across
        if u == Vector2::zeros() {
            return Token::NoJunction;
        }

        let angle = angle_between(&u, &w);
        let Some(turn) = Turn::from_angle(angle) else {
            trace!("angle {} at {} is not a turn", angle, window[1]);
            return Token::NoJunction;
        };

        let junction = self
            .junction_at(grid, &p1, &u)
            .or_else(|| self.junction_at(grid, &(p0 + u * 2), &u));

        match junction {
            Some(name) => {
                debug!("{} junction at {} turning {}", name, window[1], turn);
                Token::Junction {
                    name: name.to_string(),
                    turn,
                }
            }
            None => Token::NoJunction,
        }
    }

    /// Classify every window of `path`, failing with [`Error::InvalidPath`] below four points
    pub fn try_classify(&self, grid: &BinaryGrid, path: &[Point]) -> Result<TokenSequence> {
        if path.len() < WINDOW {
            return Err(Error::InvalidPath { len: path.len() });
        }

        Ok(path
            .windows(WINDOW)
            .map(|window| {
                let window = [window[0], window[1], window[2], window[3]];
                self.classify_window(grid, &window)
            })
            .collect())
    }

    /// Like [`JunctionClassifier::try_classify`], a path that is too short gives no tokens
    pub fn classify(&self, grid: &BinaryGrid, path: &[Point]) -> TokenSequence {
        match self.try_classify(grid, path) {
            Ok(tokens) => tokens,
            Err(e) => {
                debug!("no tokens: {}", e);
                TokenSequence::new()
            }
        }
    }
}

#[cfg(test)]
mod test {

    use super::*;

    fn path(points: &[(i32, i32)]) -> Vec<Point> {
        points.iter().copied().map(Point::from).collect()
    }

    fn junction(name: &str, turn: Turn) -> Token {
        Token::Junction {
            name: name.to_string(),
            turn,
        }
    }

    /// A track along y = 2 with a branch going south at x = 3
    fn right_tack_grid() -> BinaryGrid {
        "
        .......
        .......
        #######
        ...#...
        ...#...
        ...#...
        ...#...
        "
        .parse()
        .unwrap()
    }

    fn cross_grid() -> BinaryGrid {
        "
        ...#...
        ...#...
        ...#...
        #######
        ...#...
        ...#...
        ...#...
        "
        .parse()
        .unwrap()
    }

    #[test]
    fn test_right_turn_angle_is_exact() {
        let p = path(&[(0, 0), (1, 0), (2, 0), (2, 1)]);
        let angle_uw = turn_angle(p[1] - p[0], p[3] - p[2]);
        assert_eq!(angle_uw, 90.0);
        assert_eq!(Turn::from_angle(angle_uw), Some(Turn::Right));
    }

    #[test]
    fn test_turn_angles() {
        let east = Point::new(1, 0);
        assert_eq!(turn_angle(east, Point::new(3, 0)), 0.0);
        assert_eq!(turn_angle(east, Point::new(0, -1)), -90.0);
        assert_eq!(turn_angle(Point::new(1, 1), Point::new(-1, 1)), 90.0);
        assert!((turn_angle(east, Point::new(1, 1)) - 45.0).abs() < 1e-12);
        assert_eq!(Turn::from_angle(45.0), None);
        assert_eq!(Turn::from_angle(180.0), None);
    }

    #[test]
    fn test_turn_labels() {
        for turn in [Turn::Forward, Turn::Left, Turn::Right] {
            assert_eq!(turn.to_string().parse::<Turn>().unwrap(), turn);
        }
        assert!("backwards".parse::<Turn>().is_err());
    }

    #[test]
    fn test_sense() {
        let grid = right_tack_grid();
        let east = Point::new(1, 0);
        assert_eq!(
            JunctionClassifier::sense(&grid, Point::new(3, 2), east),
            [0, 0, 1, 1, 1]
        );
        assert_eq!(
            JunctionClassifier::sense(&grid, Point::new(1, 2), east),
            [0, 0, 1, 0, 0]
        );
        // travelling west flips left and right
        assert_eq!(
            JunctionClassifier::sense(&grid, Point::new(3, 2), Point::new(-1, 0)),
            [1, 1, 1, 0, 0]
        );
        // off-grid cells read as background
        let full = BinaryGrid::filled(3, 3, true);
        assert_eq!(
            JunctionClassifier::sense(&full, Point::new(0, 0), east),
            [0, 0, 1, 1, 1]
        );
    }

    #[test]
    fn test_straight_path_without_junction() {
        let grid = right_tack_grid();
        let classifier = JunctionClassifier::default();

        let tokens = classifier.classify(&grid, &path(&[(0, 2), (1, 2), (2, 2), (3, 2)]));
        assert_eq!(tokens.to_vec(), vec![Token::NoJunction]);

        let blank = BinaryGrid::new(10, 10);
        let long = path(&[(1, 5), (2, 5), (3, 5), (4, 5), (5, 5), (6, 5), (7, 5), (8, 5)]);
        let tokens = classifier.classify(&blank, &long);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens.to_string(), "-");
    }

    #[test]
    fn test_right_tack_with_right_turn() {
        let grid = right_tack_grid();
        let tokens = JunctionClassifier::default()
            .classify(&grid, &path(&[(1, 2), (2, 2), (3, 2), (3, 3)]));
        assert_eq!(tokens.to_vec(), vec![junction("rightTack", Turn::Right)]);
        assert_eq!(tokens.to_string(), "rightTack:right");
    }

    #[test]
    fn test_left_tack_with_left_turn() {
        let grid: BinaryGrid = "
            ...#...
            ...#...
            ...#...
            ...#...
            #######
            .......
            .......
        "
        .parse()
        .unwrap();
        let tokens = JunctionClassifier::default()
            .classify(&grid, &path(&[(1, 4), (2, 4), (3, 4), (3, 3)]));
        assert_eq!(tokens.to_vec(), vec![junction("leftTack", Turn::Left)]);
    }

    #[test]
    fn test_path_through_cross() {
        let grid = cross_grid();
        let straight = path(&[(0, 3), (1, 3), (2, 3), (3, 3), (4, 3), (5, 3), (6, 3)]);
        let tokens = JunctionClassifier::default().classify(&grid, &straight);
        assert_eq!(
            tokens.to_vec(),
            vec![
                Token::NoJunction,
                junction("cross", Turn::Forward),
                junction("cross", Turn::Forward),
                Token::NoJunction,
            ]
        );
        assert_eq!(
            tokens.junctions().collect::<Vec<_>>(),
            vec![("cross", Turn::Forward), ("cross", Turn::Forward)]
        );
    }

    #[test]
    fn test_diagonal_turn_emits_marker() {
        // the secondary anchor sits on the cross but the path bends by 45 degrees
        let grid = cross_grid();
        let tokens = JunctionClassifier::default()
            .classify(&grid, &path(&[(1, 3), (2, 3), (3, 3), (4, 4)]));
        assert_eq!(tokens.to_vec(), vec![Token::NoJunction]);
    }

    #[test]
    fn test_repeated_points() {
        let grid = BinaryGrid::filled(5, 5, true);
        let tokens = JunctionClassifier::default()
            .classify(&grid, &path(&[(2, 2), (2, 2), (2, 2), (2, 2)]));
        assert_eq!(tokens.to_vec(), vec![Token::NoJunction]);
    }

    #[test]
    fn test_extreme_coordinates() {
        let grid = cross_grid();
        let classifier = JunctionClassifier::default();

        let far = path(&[(0, 0), (i32::MAX / 2 + 1, 0), (0, 0), (1, 0)]);
        assert_eq!(classifier.classify(&grid, &far).to_vec(), vec![Token::NoJunction]);

        let corners = path(&[
            (i32::MIN, i32::MIN),
            (i32::MAX, i32::MIN),
            (i32::MAX, i32::MAX),
            (i32::MIN, i32::MAX),
        ]);
        assert_eq!(classifier.classify(&grid, &corners).to_vec(), vec![Token::NoJunction]);

        assert_eq!(
            turn_angle(Point::new(i32::MAX, 0), Point::new(0, i32::MAX)),
            90.0
        );
        assert_eq!(
            JunctionClassifier::sense(&grid, Point::new(i32::MAX, i32::MAX), Point::new(1, 0)),
            [0; SENSOR_WIDTH]
        );
    }

    #[test]
    fn test_short_path() {
        let grid = cross_grid();
        let classifier = JunctionClassifier::default();
        let short = path(&[(1, 3), (2, 3), (3, 3)]);
        assert!(classifier.classify(&grid, &short).is_empty());
        assert!(matches!(
            classifier.try_classify(&grid, &short),
            Err(Error::InvalidPath { len: 3 })
        ));
        assert!(classifier.classify(&grid, &[]).is_empty());
    }

    #[test]
    fn test_token_sequence_collapses_markers() {
        let tokens: TokenSequence = [
            Token::NoJunction,
            Token::NoJunction,
            junction("cross", Turn::Left),
            Token::NoJunction,
            Token::NoJunction,
            Token::NoJunction,
        ]
        .into_iter()
        .collect();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens.to_string(), "- cross:left -");
    }

    #[test]
    fn test_registry_first_match_wins() {
        let mut registry = JunctionRegistry::empty();
        registry.register("first", [0, 0, 1, 1, 1]).unwrap();
        registry.register("second", [0, 0, 1, 1, 1]).unwrap();
        assert_eq!(registry.match_reading(&[0, 0, 1, 1, 1]), Some("first"));

        // replacing keeps the position
        registry.register("first", [1, 1, 1, 0, 0]).unwrap();
        assert_eq!(registry.match_reading(&[0, 0, 1, 1, 1]), Some("second"));
        assert_eq!(
            registry.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            vec!["first", "second"]
        );

        assert!(registry.register("bad", [0, 2, 1, 0, 0]).is_err());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_injected_registry() {
        let grid = right_tack_grid();
        let mut registry = JunctionRegistry::empty();
        registry.register("branch", [0, 0, 1, 1, 1]).unwrap();
        let tokens = JunctionClassifier::new(registry)
            .classify(&grid, &path(&[(1, 2), (2, 2), (3, 2), (3, 3)]));
        assert_eq!(tokens.to_string(), "branch:right");

        let tokens = JunctionClassifier::new(JunctionRegistry::empty())
            .classify(&grid, &path(&[(1, 2), (2, 2), (3, 2), (3, 3)]));
        assert_eq!(tokens.to_string(), "-");
    }

    #[test]
    fn test_registry_json() {
        let registry = JunctionRegistry::from_json(
            r#"[
                {"name": "tee", "pattern": [1, 1, 1, 1, 1]},
                {"name": "leftTack", "pattern": [1, 1, 1, 0, 0]}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            registry.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            vec!["tee", "leftTack"]
        );
        assert_eq!(registry.get("tee"), Some(&[1, 1, 1, 1, 1]));

        let json = serde_json::to_string(&JunctionRegistry::default()).unwrap();
        assert_eq!(
            JunctionRegistry::from_json(&json).unwrap(),
            JunctionRegistry::default()
        );

        assert!(JunctionRegistry::from_json(r#"[{"name": "x", "pattern": [1, 1, 1]}]"#).is_err());
        assert!(JunctionRegistry::from_json(r#"[{"name": "x", "pattern": [1, 1, 1, 0, 5]}]"#).is_err());
    }
}
