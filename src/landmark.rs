use crate::error::{Error, Result};

/// Named anchor in the aligned-face reference frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Landmark {
    pub name: &'static str,
    pub x: i64,
    pub y: i64,
    /// Source pixels per filter pixel; the whole face needs a wider view.
    pub scale: u32,
}

const fn mark(name: &'static str, x: i64, y: i64, scale: u32) -> Landmark {
    Landmark { name, x, y, scale }
}

pub const LANDMARKS: &[Landmark] = &[
    mark("left_eye", 43, 34, 1),
    mark("right_eye", 73, 33, 1),
    mark("eyes", 58, 34, 1),
    mark("nose", 58, 50, 1),
    mark("mouth", 58, 66, 1),
    mark("face", 59, 47, 2),
];

impl Landmark {
    pub fn lookup(name: &str) -> Result<Self> {
        LANDMARKS
            .iter(/**/)
            .find(|mark| mark.name == name)
            .copied(/**/)
            .ok_or_else(|| Error::UnknownLandmark(name.to_string(/**/)))
    }

    pub fn anchor(&self) -> (i64, i64) {
        (self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        let eye = Landmark::lookup("right_eye").unwrap();
        assert_eq!(eye.anchor(), (73, 33));
        assert_eq!(Landmark::lookup("face").unwrap().scale, 2);
    }

    #[test]
    fn unknown_name() {
        assert!(matches!(Landmark::lookup("chin"), Err(Error::UnknownLandmark(n)) if n == "chin"));
    }

    #[test]
    fn names_are_unique() {
        for (i, a) in LANDMARKS.iter().enumerate() {
            assert!(LANDMARKS[i + 1..].iter().all(|b| b.name != a.name));
        }
    }
}
