use std::fmt;

/// One step of a dotted path: either a mapping key or a sequence index.
///
/// `a.b.0.c` parses to `[Key("a"), Key("b"), Index(0), Key("c")]` — a purely
/// numeric segment is always treated as a list index, never a map key, which
/// matches how this document layout is actually used (config keys are never
/// bare integers).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path(pub Vec<Segment>);

impl Path {
    pub fn parse(s: &str) -> Path {
        let segs = s
            .split('.')
            .map(|part| match part.parse::<usize>() {
                Ok(i) => Segment::Index(i),
                Err(_) => Segment::Key(part.to_string()),
            })
            .collect();
        Path(segs)
    }

    pub fn push_key(&self, key: &str) -> Path {
        let mut segs = self.0.clone();
        segs.push(Segment::Key(key.to_string()));
        Path(segs)
    }

    pub fn push_index(&self, idx: usize) -> Path {
        let mut segs = self.0.clone();
        segs.push(Segment::Index(idx));
        Path(segs)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|s| match s {
                Segment::Key(k) => k.clone(),
                Segment::Index(i) => i.to_string(),
            })
            .collect();
        write!(f, "{}", parts.join("."))
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Path {
        Path::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_display() {
        let p = Path::parse("provider.region");
        assert_eq!(p.to_string(), "provider.region");
    }

    #[test]
    fn numeric_segment_is_an_index() {
        let p = Path::parse("instances.0.name");
        assert_eq!(p.0, vec![
            Segment::Key("instances".into()),
            Segment::Index(0),
            Segment::Key("name".into()),
        ]);
    }
}
