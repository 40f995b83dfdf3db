use crate::errors::{AppError, AppResult};
use crate::models::ElementRecord;
use crate::utils::is_gzip_path;
use flate2::read::GzDecoder;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Streams element-end events out of an XML document.
///
/// Elements are yielded in the order their end tags appear (children before
/// their parent), each as an owned [`ElementRecord`]. Only the attributes of
/// the currently open ancestors are held, so memory is bounded by nesting
/// depth and the size of the largest single tag, never by document size.
///
/// Each call to [`ElementStream::next_element`] does a bounded amount of
/// read/parse work on the caller's thread.
///
/// # Errors
///
/// Malformed markup, an unclosed element at end of input, content outside
/// the single root element, or a document with no elements at all yields
/// [`AppError::ParseError`]. After the first error
/// the stream is exhausted.
pub struct ElementStream<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    open: Vec<ElementRecord>,
    seen_element: bool,
    finished: bool,
}

impl ElementStream<Box<dyn BufRead>> {
    /// Opens a source document, decompressing on the fly when the filename ends in `.gz`.
    pub fn open(path: &Path) -> AppResult<Self> {
        let file = File::open(path).map_err(|e| {
            AppError::IoError(format!(
                "Failed to open source document {}: {e}",
                path.display()
            ))
        })?;

        let inner: Box<dyn BufRead> = if is_gzip_path(path) {
            debug!(source = %path.display(), "Reading gzip-compressed source");
            Box::new(BufReader::new(GzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };

        Ok(Self::from_reader(inner))
    }
}

impl<R: BufRead> ElementStream<R> {
    pub fn from_reader(inner: R) -> Self {
        let mut reader = Reader::from_reader(inner);
        reader.config_mut().trim_text(true);

        Self {
            reader,
            buf: Vec::with_capacity(8192),
            open: Vec::with_capacity(8),
            seen_element: false,
            finished: false,
        }
    }

    /// Reads up to the next element end and returns that element.
    ///
    /// Returns `Ok(None)` once the document has been fully consumed.
    pub fn next_element(&mut self) -> AppResult<Option<ElementRecord>> {
        if self.finished {
            return Ok(None);
        }

        let result = self.advance();
        if !matches!(result, Ok(Some(_))) {
            self.finished = true;
        }
        result
    }

    /// Number of currently open ancestor elements.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Approximate bytes held for parsing state: the event buffer plus the
    /// tags and attributes of open ancestors.
    pub fn retained_bytes(&self) -> usize {
        let open: usize = self
            .open
            .iter()
            .map(|record| {
                record.tag.len()
                    + record
                        .attributes
                        .iter()
                        .map(|(k, v)| k.len() + v.len())
                        .sum::<usize>()
            })
            .sum();
        self.buf.capacity() + open
    }

    fn advance(&mut self) -> AppResult<Option<ElementRecord>> {
        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(e) => {
                    return Err(AppError::ParseError(format!(
                        "Malformed XML near byte {}: {e}",
                        self.reader.buffer_position()
                    )));
                }
            };

            let root_closed = self.seen_element && self.open.is_empty();

            match event {
                Event::Start(_) | Event::Empty(_) | Event::End(_) if root_closed => {
                    return Err(content_after_root(self.reader.buffer_position()));
                }
                Event::Text(e)
                    if self.open.is_empty() && !e.iter().all(u8::is_ascii_whitespace) =>
                {
                    return Err(content_after_root(self.reader.buffer_position()));
                }
                Event::CData(_) | Event::GeneralRef(_) if self.open.is_empty() => {
                    return Err(content_after_root(self.reader.buffer_position()));
                }
                Event::Start(e) => {
                    let record = element_record(&e, self.reader.decoder())?;
                    self.seen_element = true;
                    self.open.push(record);
                }
                Event::Empty(e) => {
                    self.seen_element = true;
                    return element_record(&e, self.reader.decoder()).map(Some);
                }
                Event::End(_) => {
                    return match self.open.pop() {
                        Some(record) => Ok(Some(record)),
                        None => Err(AppError::ParseError(format!(
                            "Unexpected end tag near byte {}",
                            self.reader.buffer_position()
                        ))),
                    };
                }
                Event::Eof => {
                    if let Some(unclosed) = self.open.last() {
                        return Err(AppError::ParseError(format!(
                            "Truncated document: <{}> is never closed",
                            unclosed.tag
                        )));
                    }
                    if !self.seen_element {
                        return Err(AppError::ParseError(
                            "Document contains no elements".to_string(),
                        ));
                    }
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for ElementStream<R> {
    type Item = AppResult<ElementRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_element().transpose()
    }
}

fn content_after_root(position: impl std::fmt::Display) -> AppError {
    AppError::ParseError(format!(
        "Content outside the root element near byte {position}"
    ))
}

fn element_record(start: &BytesStart, decoder: Decoder) -> AppResult<ElementRecord> {
    let tag = decoder
        .decode(start.name().as_ref())
        .map_err(|e| AppError::ParseError(format!("Failed to decode element name: {e}")))?
        .into_owned();
    let mut record = ElementRecord::new(tag);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| {
            AppError::ParseError(format!("Malformed attribute in <{}>: {e}", record.tag))
        })?;
        let key = decoder
            .decode(attr.key.as_ref())
            .map_err(|e| AppError::ParseError(format!("Failed to decode attribute name: {e}")))?
            .into_owned();
        let value = attr
            .decode_and_unescape_value(decoder)
            .map_err(|e| {
                AppError::ParseError(format!(
                    "Failed to decode attribute {key} in <{}>: {e}",
                    record.tag
                ))
            })?
            .into_owned();
        record.attributes.insert(key, value);
    }

    Ok(record)
}
