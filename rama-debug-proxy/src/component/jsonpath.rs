//! The JSON path grammar used by `json-body-modify` (spec.md §4.4):
//! `seg(.seg|[idx])*`, e.g. `user.name`, `items[0].price`.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Parse a path string into its segments.
///
/// Grammar: a leading key, then any number of `.key` or `[index]`
/// continuations. Returns `None` on malformed input (empty path, an
/// unterminated `[`, or a non-numeric index).
fn parse(path: &str) -> Option<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut chars = path.chars().peekable();
    let mut current = String::new();

    fn flush(current: &mut String, segments: &mut Vec<Segment>) {
        if !current.is_empty() {
            segments.push(Segment::Key(std::mem::take(current)));
        }
    }

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                flush(&mut current, &mut segments);
            }
            '[' => {
                flush(&mut current, &mut segments);
                let mut idx = String::new();
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some(d) => idx.push(d),
                        None => return None,
                    }
                }
                let idx: usize = idx.parse().ok()?;
                segments.push(Segment::Index(idx));
            }
            other => current.push(other),
        }
    }
    flush(&mut current, &mut segments);

    if segments.is_empty() { None } else { Some(segments) }
}

fn navigate_mut<'a>(root: &'a mut Value, segments: &[Segment]) -> Option<&'a mut Value> {
    let mut current = root;
    for segment in segments {
        current = match (segment, current) {
            (Segment::Key(key), Value::Object(map)) => map.get_mut(key)?,
            (Segment::Index(idx), Value::Array(arr)) => arr.get_mut(*idx)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Set the value at `path`, creating missing intermediate objects along
/// the way (arrays are never auto-created; an `[idx]` segment requires an
/// existing array at that point).
pub fn set(root: &mut Value, path: &str, value: Value) -> Result<(), String> {
    let segments = parse(path).ok_or_else(|| format!("malformed json path: {path}"))?;
    let (last, parents) = segments.split_last().expect("parse() never returns empty");

    let mut current = root;
    for segment in parents {
        current = match segment {
            Segment::Key(key) => {
                if !current.is_object() {
                    *current = Value::Object(serde_json::Map::new());
                }
                current
                    .as_object_mut()
                    .expect("just coerced to object")
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(serde_json::Map::new()))
            }
            Segment::Index(idx) => current
                .as_array_mut()
                .ok_or_else(|| format!("json path {path} indexes into a non-array"))?
                .get_mut(*idx)
                .ok_or_else(|| format!("json path {path} index {idx} out of bounds"))?,
        };
    }

    match last {
        Segment::Key(key) => {
            if !current.is_object() {
                *current = Value::Object(serde_json::Map::new());
            }
            current
                .as_object_mut()
                .expect("just coerced to object")
                .insert(key.clone(), value);
        }
        Segment::Index(idx) => {
            let arr = current
                .as_array_mut()
                .ok_or_else(|| format!("json path {path} indexes into a non-array"))?;
            if *idx < arr.len() {
                arr[*idx] = value;
            } else {
                return Err(format!("json path {path} index {idx} out of bounds"));
            }
        }
    }
    Ok(())
}

/// Remove the value at `path`: splices arrays, deletes object keys.
/// A path that does not resolve is a no-op.
pub fn remove(root: &mut Value, path: &str) -> Result<(), String> {
    let segments = parse(path).ok_or_else(|| format!("malformed json path: {path}"))?;
    let (last, parents) = segments.split_last().expect("parse() never returns empty");

    let Some(parent) = navigate_mut(root, parents) else {
        return Ok(());
    };

    match last {
        Segment::Key(key) => {
            if let Some(map) = parent.as_object_mut() {
                map.remove(key);
            }
        }
        Segment::Index(idx) => {
            if let Some(arr) = parent.as_array_mut()
                && *idx < arr.len()
            {
                arr.remove(*idx);
            }
        }
    }
    Ok(())
}

/// Append `value` at `path`. If the existing value at `path` is not an
/// array, it is coerced into a single-element array before appending
/// (spec.md §4.4: "`append` coerces a scalar to a list when appending").
/// A path that does not yet exist is created as a fresh one-element list.
pub fn append(root: &mut Value, path: &str, value: Value) -> Result<(), String> {
    let segments = parse(path).ok_or_else(|| format!("malformed json path: {path}"))?;
    let (last, parents) = segments.split_last().expect("parse() never returns empty");

    let mut current = root;
    for segment in parents {
        current = match segment {
            Segment::Key(key) => {
                if !current.is_object() {
                    *current = Value::Object(serde_json::Map::new());
                }
                current
                    .as_object_mut()
                    .expect("just coerced to object")
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(serde_json::Map::new()))
            }
            Segment::Index(idx) => current
                .as_array_mut()
                .ok_or_else(|| format!("json path {path} indexes into a non-array"))?
                .get_mut(*idx)
                .ok_or_else(|| format!("json path {path} index {idx} out of bounds"))?,
        };
    }

    let slot: &mut Value = match last {
        Segment::Key(key) => {
            if !current.is_object() {
                *current = Value::Object(serde_json::Map::new());
            }
            current
                .as_object_mut()
                .expect("just coerced to object")
                .entry(key.clone())
                .or_insert(Value::Null)
        }
        Segment::Index(idx) => current
            .as_array_mut()
            .ok_or_else(|| format!("json path {path} indexes into a non-array"))?
            .get_mut(*idx)
            .ok_or_else(|| format!("json path {path} index {idx} out of bounds"))?,
    };

    match slot {
        Value::Array(arr) => arr.push(value),
        Value::Null => *slot = Value::Array(vec![value]),
        other => {
            let existing = std::mem::replace(other, Value::Null);
            *slot = Value::Array(vec![existing, value]);
        }
    }
    Ok(())
}
