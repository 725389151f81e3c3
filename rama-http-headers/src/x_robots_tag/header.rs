use crate::{Error, HeaderDecode, HeaderEncode, TypedHeader, x_robots_tag::robots_tag_parse_iter};

use super::RobotsTag;
use rama_core::telemetry::tracing;
use rama_http_types::{HeaderName, HeaderValue};
use rama_utils::{collections::NonEmptyVec, macros::generate_set_and_with};

#[derive(Debug, Clone)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct XRobotsTag(pub NonEmptyVec<RobotsTag>);

impl TypedHeader for XRobotsTag {
    fn name() -> &'static HeaderName {
        &rama_http_types::header::X_ROBOTS_TAG
    }
}

impl XRobotsTag {
    #[inline(always)]
    pub fn new(tag: RobotsTag) -> Self {
        Self(NonEmptyVec::new(tag))
    }

    generate_set_and_with! {
        /// Set provided header in the header map
        /// Warning: this function will replace already existing headers
        /// If more control is needed, use `.header_map()` or `.header_map_raw()`
        /// to get access to the underlying header map
        pub fn additional_tag(
            mut self,
            tag: RobotsTag,
        ) -> Self {
            self.0.push(tag);
            self
        }
    }

    #[must_use]
    pub fn into_first_tag(self) -> RobotsTag {
        self.0.head
    }

    #[must_use]
    pub fn first_tag(&self) -> &RobotsTag {
        self.0.first()
    }
}

impl HeaderDecode for XRobotsTag {
    fn decode<'i, I>(values: &mut I) -> Result<Self, Error>
    where
        Self: Sized,
        I: Iterator<Item = &'i HeaderValue>,
    {
        let elements = values.try_fold(None, |mut acc, value| {
            for result in robots_tag_parse_iter(value.as_bytes()) {
                match result {
                    Ok(extra) => match acc {
                        None => acc = Some(NonEmptyVec::new(extra)),
                        Some(ref mut acc) => acc.push(extra),
                    },
                    Err(err) => {
                        tracing::debug!(?err, "x-robots-tag header element decoding failure");
                        return Err(Error::invalid());
                    }
                }
            }
            Ok(acc)
        })?;

        if let Some(elements) = elements {
            Ok(Self(elements))
        } else {
            tracing::debug!("no values founds for x-robots-tag header");
            Err(Error::invalid())
        }
    }
}

impl HeaderEncode for XRobotsTag {
    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        use std::fmt;
        struct Format<F>(F);
        impl<F> fmt::Display for Format<F>
        where
            F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result,
        {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                self.0(f)
            }
        }
        let s = format!(
            "{}",
            Format(|f: &mut fmt::Formatter<'_>| {
                crate::util::csv::fmt_comma_delimited(&mut *f, self.0.iter())
            })
        );
        match HeaderValue::from_maybe_shared(s) {
            Ok(v) => values.extend(::std::iter::once(v)),
            Err(err) => {
                tracing::debug!("failed to encode x-robots-tag as header value: {err}");
            }
        }
    }
}
