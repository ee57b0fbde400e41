use std::iter::FusedIterator;
use crate::error::Error;
use crate::request::LineStream;

/// One parsed line of a streamed response.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamChunk {
    /// Text delta, may be empty.
    pub text: String,
    /// Backend signalled the end of the answer.
    pub done: bool,
}

impl StreamChunk {
    pub(crate) fn delta(text: impl Into<String>) -> Self {
        StreamChunk { text: text.into(), done: false }
    }

    pub(crate) fn end() -> Self {
        StreamChunk { text: String::new(), done: true }
    }
}

/// Backend-specific line decoder. `Ok(None)` skips the line.
pub(crate) type ChunkParser = fn(&str) -> Result<Option<StreamChunk>, Error>;

/// Lazy sequence of non-empty text fragments.
///
/// Every call to `next` reads from the response body until a fragment is
/// available. The sequence ends at the backend's end marker, at end of body,
/// or right after the first error. It cannot be restarted.
pub struct TextStream {
    lines: LineStream,
    parse: ChunkParser,
    finished: bool,
}

impl TextStream {
    pub(crate) fn new(lines: LineStream, parse: ChunkParser) -> Self {
        TextStream { lines, parse, finished: false }
    }

    /// Drain the stream into one string.
    pub fn collect_text(self) -> Result<String, Error> {
        self.collect()
    }

    fn fail(&mut self, err: Error) -> Option<Result<String, Error>> {
        self.finished = true;
        Some(Err(err))
    }
}

impl Iterator for TextStream {
    type Item = Result<String, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let line = match self.lines.next() {
                None => {
                    self.finished = true;
                    return None;
                }
                Some(Err(err)) => return self.fail(err),
                Some(Ok(line)) => line,
            };

            match (self.parse)(&line) {
                Err(err) => return self.fail(err),
                Ok(None) => continue,
                Ok(Some(chunk)) => {
                    self.finished = chunk.done;
                    if !chunk.text.is_empty() {
                        return Some(Ok(chunk.text));
                    }
                }
            }
        }
        None
    }
}

impl FusedIterator for TextStream {}


#[cfg(test)]
mod tests {
    use super::*;

    fn plain(line: &str) -> Result<Option<StreamChunk>, Error> {
        match line {
            "" => Ok(None),
            "END" => Ok(Some(StreamChunk::end())),
            "BAD" => Err(Error::LLMResponseError("bad line")),
            text => Ok(Some(StreamChunk::delta(text))),
        }
    }

    fn lines(items: &[&str]) -> LineStream {
        let items: Vec<String> = items.iter().map(|s| s.to_string()).collect();
        Box::new(items.into_iter().map(Ok))
    }

    #[test]
    fn test_fragments_in_order() {
        let stream = TextStream::new(lines(&["He", "", "llo"]), plain);
        let fragments: Vec<String> = stream.map(|f| f.expect("fragment")).collect();
        assert_eq!(fragments, vec!["He", "llo"]);
    }

    #[test]
    fn test_stops_at_end_marker() {
        let stream = TextStream::new(lines(&["a", "END", "b"]), plain);
        assert_eq!(stream.collect_text().expect("text"), "a");
    }

    #[test]
    fn test_stops_after_error() {
        let mut stream = TextStream::new(lines(&["a", "BAD", "b"]), plain);
        assert_eq!(stream.next().unwrap().unwrap(), "a");
        assert!(matches!(stream.next(), Some(Err(Error::LLMResponseError(_)))));
        assert!(stream.next().is_none());
        assert!(stream.next().is_none());
    }
}
