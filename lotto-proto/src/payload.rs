//! Payload layouts for each message kind.
//!
//! | kind                    | payload                                   |
//! |-------------------------|-------------------------------------------|
//! | `Batch`                 | `<agency>\|\|<bet>;;<bet>;;...`           |
//! | `Response`              | `<true\|false>\|<message>`                |
//! | `FinishedNotification`  | `<agency>`                                |
//! | `WinnersQuery`          | `<agency>`                                |
//! | `WinnersResponse`       | `<document>\|<document>...` (may be empty) |
//!
//! where `<bet>` is `<agency>|<first>|<last>|<document>|<birthdate>|<number>`.
//! Delimiters are not escaped: field content must not contain them.

use crate::error::{Error, Result};
use crate::message::{
    Batch, Bet, FIELD_DELIM, FinishedNotification, Kind, Message, RECORD_DELIM, Response,
    WinnersQuery, WinnersResponse,
};

/// Separates the batch agency from its bet records.
const BATCH_SEP: &str = "||";

/// [`FIELD_DELIM`] as a string, for joining.
const FIELD_SEP: &str = "|";

/// Number of fields in a serialized bet.
const BET_FIELDS: usize = 6;

impl Bet {
    /// Appends this bet's `|`-joined fields to `out`.
    pub fn write_payload(&self, out: &mut String) {
        out.push_str(&self.agency);
        for field in [
            &self.first_name,
            &self.last_name,
            &self.document,
            &self.birthdate,
            &self.number,
        ] {
            out.push(FIELD_DELIM);
            out.push_str(field);
        }
    }

    /// Serializes this bet to its `|`-joined form.
    pub fn to_payload(&self) -> String {
        let mut out = String::new();
        self.write_payload(&mut out);
        out
    }

    /// Parses a `|`-joined bet record. Exactly six fields are required.
    pub fn from_payload(record: &str) -> Result<Self> {
        let fields: Vec<&str> = record.split(FIELD_DELIM).collect();
        let [agency, first, last, document, birthdate, number] = fields[..] else {
            return Err(Error::malformed(
                Kind::Batch,
                format!("bet has {} fields, expected {BET_FIELDS}", fields.len()),
            ));
        };
        Ok(Self::new(agency, first, last, document, birthdate, number))
    }
}

impl Message {
    /// Serializes the payload (everything after the frame header).
    pub fn to_payload(&self) -> Vec<u8> {
        let text = match self {
            Self::Batch(batch) => batch_payload(batch),
            Self::Response(resp) => {
                let flag = if resp.success { "true" } else { "false" };
                format!("{flag}{FIELD_DELIM}{}", resp.message)
            }
            Self::FinishedNotification(FinishedNotification { agency })
            | Self::WinnersQuery(WinnersQuery { agency }) => agency.clone(),
            Self::WinnersResponse(resp) => resp.winners.join(FIELD_SEP),
        };
        text.into_bytes()
    }

    /// Parses a payload according to the layout of `kind`.
    pub fn from_payload(kind: Kind, payload: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(payload)
            .map_err(|e| Error::malformed(kind, format!("invalid UTF-8: {e}")))?;
        match kind {
            Kind::Batch => parse_batch(text).map(Self::Batch),
            Kind::Response => parse_response(text).map(Self::Response),
            Kind::FinishedNotification => {
                parse_agency(kind, text).map(|agency| FinishedNotification { agency }.into())
            }
            Kind::WinnersQuery => {
                parse_agency(kind, text).map(|agency| WinnersQuery { agency }.into())
            }
            Kind::WinnersResponse => Ok(Self::WinnersResponse(parse_winners(text))),
        }
    }
}

fn batch_payload(batch: &Batch) -> String {
    let mut out = String::with_capacity(batch.agency.len() + batch.bets.len() * 64);
    out.push_str(&batch.agency);
    out.push_str(BATCH_SEP);
    for (i, bet) in batch.bets.iter().enumerate() {
        if i > 0 {
            out.push_str(RECORD_DELIM);
        }
        bet.write_payload(&mut out);
    }
    out
}

fn parse_batch(text: &str) -> Result<Batch> {
    let (agency, records) = text
        .split_once(BATCH_SEP)
        .ok_or_else(|| Error::malformed(Kind::Batch, "missing separator after agency"))?;
    if agency.is_empty() {
        return Err(Error::malformed(Kind::Batch, "empty agency"));
    }
    if records.is_empty() {
        return Err(Error::malformed(Kind::Batch, "batch carries no bets"));
    }
    let bets = records
        .split(RECORD_DELIM)
        .map(Bet::from_payload)
        .collect::<Result<Vec<_>>>()?;
    Ok(Batch::new(agency, bets))
}

fn parse_response(text: &str) -> Result<Response> {
    let fields: Vec<&str> = text.split(FIELD_DELIM).collect();
    let [flag, message] = fields[..] else {
        return Err(Error::malformed(
            Kind::Response,
            format!("expected 2 fields, got {}", fields.len()),
        ));
    };
    let success = match flag {
        "true" => true,
        "false" => false,
        other => {
            return Err(Error::malformed(
                Kind::Response,
                format!("invalid success flag {other:?}"),
            ));
        }
    };
    Ok(Response {
        success,
        message: message.to_owned(),
    })
}

fn parse_agency(kind: Kind, text: &str) -> Result<String> {
    if text.is_empty() {
        return Err(Error::malformed(kind, "empty agency"));
    }
    if text.contains(FIELD_DELIM) {
        return Err(Error::malformed(kind, "agency contains a delimiter"));
    }
    Ok(text.to_owned())
}

fn parse_winners(text: &str) -> WinnersResponse {
    if text.is_empty() {
        return WinnersResponse::default();
    }
    WinnersResponse::new(text.split(FIELD_DELIM).map(str::to_owned).collect())
}
