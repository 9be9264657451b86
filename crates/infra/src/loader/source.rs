//! Streaming decode of a JSON array source.
//!
//! Elements are handed to a sink one at a time while the array is being read, so memory
//! stays bounded by one record no matter how large the file is.

use std::fmt;
use std::io::{BufReader, Read};
use std::marker::PhantomData;
use std::ops::ControlFlow;

use serde::Deserializer as _;
use serde::de::{DeserializeOwned, SeqAccess, Visitor};

struct ElementVisitor<'a, T, F> {
    sink: &'a mut F,
    seen: &'a mut usize,
    stopped: &'a mut bool,
    _record: PhantomData<fn() -> T>,
}

impl<'de, T, F> Visitor<'de> for ElementVisitor<'_, T, F>
where
    T: DeserializeOwned,
    F: FnMut(T) -> ControlFlow<()>,
{
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON array of records")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        while let Some(element) = seq.next_element::<T>()? {
            *self.seen += 1;
            if (self.sink)(element).is_break() {
                *self.stopped = true;
                return Ok(());
            }
        }
        Ok(())
    }
}

/// Decode `reader` as a JSON array, calling `sink` for each element in order.
///
/// Returns the number of elements handed to the sink. A sink returning
/// `ControlFlow::Break` stops the decode early; whatever follows in the input is then
/// left unread and unchecked.
pub fn stream_json_array<T, F>(reader: impl Read, mut sink: F) -> Result<usize, serde_json::Error>
where
    T: DeserializeOwned,
    F: FnMut(T) -> ControlFlow<()>,
{
    let mut seen = 0;
    let mut stopped = false;
    let mut de = serde_json::Deserializer::from_reader(BufReader::new(reader));

    let result = (&mut de).deserialize_seq(ElementVisitor {
        sink: &mut sink,
        seen: &mut seen,
        stopped: &mut stopped,
        _record: PhantomData,
    });

    if stopped {
        return Ok(seen);
    }
    result?;
    de.end()?;
    Ok(seen)
}
