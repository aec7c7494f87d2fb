//! Inline Document Services
//!
//! Builds a [`Service`] from an MLT-style XML document:
//!
//! ```xml
//! <mlt title="promo">
//!   <producer in="0" out="99">
//!     <property name="resource">/media/promo.mp4</property>
//!     <property name="length">250</property>
//!   </producer>
//! </mlt>
//! ```
//!
//! Every `producer` with a `resource` property becomes one playlist entry.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::warn;

use crate::unit::{PlaylistEntry, Profile, Service, ServiceFactory};
use crate::Frame;

/// [`ServiceFactory`] over MLT-style XML
#[derive(Clone, Debug)]
pub struct XmlServiceFactory {
    default_length: Frame,
}

impl XmlServiceFactory {
    /// `default_length` applies to producers that state neither a length
    /// nor an out point
    pub fn new(default_length: Frame) -> Self {
        Self {
            default_length: default_length.max(1),
        }
    }
}

impl ServiceFactory for XmlServiceFactory {
    fn from_document(&self, profile: &Profile, document: &str) -> Option<Service> {
        match parse(profile, document, self.default_length) {
            Ok(service) => service,
            Err(e) => {
                warn!(error = %e, "Malformed service document");
                None
            }
        }
    }
}

#[derive(Default)]
struct ProducerDraft {
    in_point: Option<Frame>,
    out_point: Option<Frame>,
    resource: Option<String>,
    length: Option<Frame>,
}

impl ProducerDraft {
    fn from_element(e: &BytesStart<'_>) -> Self {
        let mut draft = Self::default();
        for attr in e.attributes().flatten() {
            let value = String::from_utf8_lossy(&attr.value);
            match attr.key.as_ref() {
                b"in" => draft.in_point = value.trim().parse().ok(),
                b"out" => draft.out_point = value.trim().parse().ok(),
                b"resource" => draft.resource = Some(value.into_owned()),
                _ => {}
            }
        }
        draft
    }

    fn set(&mut self, property: &str, value: String) {
        match property {
            "resource" => self.resource = Some(value),
            "length" => self.length = value.trim().parse().ok(),
            _ => {}
        }
    }

    fn finish(self, fps: f64, default_length: Frame) -> Option<PlaylistEntry> {
        let resource = self.resource.filter(|r| !r.is_empty())?;
        // An out point at the top of the frame range has no representable length
        let length = match (self.length, self.out_point) {
            (Some(length), _) => length,
            (None, Some(out)) => out.checked_add(1)?,
            (None, None) => default_length,
        }
        .max(1);
        Some(
            PlaylistEntry::new(&resource, length, fps)
                .with_points(self.in_point.unwrap_or(-1), self.out_point.unwrap_or(-1)),
        )
    }
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

fn parse(
    profile: &Profile,
    document: &str,
    default_length: Frame,
) -> Result<Option<Service>, quick_xml::Error> {
    let mut xml = Reader::from_str(document);
    xml.config_mut().trim_text(true);

    let mut title = None;
    let mut entries = Vec::new();
    let mut producer: Option<ProducerDraft> = None;
    let mut property: Option<String> = None;

    loop {
        match xml.read_event()? {
            Event::Eof => break,
            Event::Start(ref e) => match e.name().as_ref() {
                b"mlt" => title = attribute(e, b"title"),
                b"producer" => producer = Some(ProducerDraft::from_element(e)),
                b"property" if producer.is_some() => property = attribute(e, b"name"),
                _ => {}
            },
            Event::Empty(ref e) => match e.name().as_ref() {
                b"mlt" => title = attribute(e, b"title"),
                b"producer" => {
                    entries.extend(
                        ProducerDraft::from_element(e).finish(profile.fps, default_length),
                    );
                }
                _ => {}
            },
            Event::Text(ref e) => {
                if let (Some(draft), Some(name)) = (producer.as_mut(), property.as_deref()) {
                    draft.set(name, e.unescape()?.into_owned());
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"property" => property = None,
                b"producer" => {
                    if let Some(draft) = producer.take() {
                        entries.extend(draft.finish(profile.fps, default_length));
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }

    if entries.is_empty() {
        return Ok(None);
    }
    let label = title.unwrap_or_else(|| entries[0].resource.clone());
    Ok(Some(Service::new(&label, entries)))
}
