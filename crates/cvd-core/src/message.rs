//! Protocol message taxonomy and the message value exchanged between actors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CvdError;

/// Which state axis a message talks about. Every message type belongs to
/// exactly one category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MessageCategory {
    ReportManagement,
    EmbargoManagement,
    CaseState,
    General,
}

impl MessageCategory {
    pub fn prefix(&self) -> char {
        match self {
            MessageCategory::ReportManagement => 'R',
            MessageCategory::EmbargoManagement => 'E',
            MessageCategory::CaseState => 'C',
            MessageCategory::General => 'G',
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MessageType {
    #[serde(rename = "RS")]
    ReportSubmission,
    #[serde(rename = "RI")]
    ReportInvalid,
    #[serde(rename = "RV")]
    ReportValid,
    #[serde(rename = "RD")]
    ReportDeferred,
    #[serde(rename = "RA")]
    ReportAccepted,
    #[serde(rename = "RC")]
    ReportClosed,
    #[serde(rename = "RK")]
    ReportAck,
    #[serde(rename = "RE")]
    ReportError,

    #[serde(rename = "EP")]
    EmbargoProposal,
    #[serde(rename = "ER")]
    EmbargoRejected,
    #[serde(rename = "EA")]
    EmbargoAccepted,
    #[serde(rename = "EV")]
    EmbargoRevisionProposal,
    #[serde(rename = "EJ")]
    EmbargoRevisionRejected,
    #[serde(rename = "EC")]
    EmbargoRevisionAccepted,
    #[serde(rename = "ET")]
    EmbargoTerminated,
    #[serde(rename = "EK")]
    EmbargoAck,
    #[serde(rename = "EE")]
    EmbargoError,

    #[serde(rename = "CV")]
    VendorAware,
    #[serde(rename = "CF")]
    FixReady,
    #[serde(rename = "CD")]
    FixDeployed,
    #[serde(rename = "CP")]
    PublicAware,
    #[serde(rename = "CX")]
    ExploitPublished,
    #[serde(rename = "CA")]
    AttacksObserved,
    #[serde(rename = "CK")]
    CaseStateAck,
    #[serde(rename = "CE")]
    CaseStateError,

    #[serde(rename = "GI")]
    GeneralInquiry,
    #[serde(rename = "GK")]
    GeneralAck,
    #[serde(rename = "GE")]
    GeneralError,
}

impl MessageType {
    pub const ALL: [MessageType; 28] = [
        MessageType::ReportSubmission,
        MessageType::ReportInvalid,
        MessageType::ReportValid,
        MessageType::ReportDeferred,
        MessageType::ReportAccepted,
        MessageType::ReportClosed,
        MessageType::ReportAck,
        MessageType::ReportError,
        MessageType::EmbargoProposal,
        MessageType::EmbargoRejected,
        MessageType::EmbargoAccepted,
        MessageType::EmbargoRevisionProposal,
        MessageType::EmbargoRevisionRejected,
        MessageType::EmbargoRevisionAccepted,
        MessageType::EmbargoTerminated,
        MessageType::EmbargoAck,
        MessageType::EmbargoError,
        MessageType::VendorAware,
        MessageType::FixReady,
        MessageType::FixDeployed,
        MessageType::PublicAware,
        MessageType::ExploitPublished,
        MessageType::AttacksObserved,
        MessageType::CaseStateAck,
        MessageType::CaseStateError,
        MessageType::GeneralInquiry,
        MessageType::GeneralAck,
        MessageType::GeneralError,
    ];

    /// Two-letter wire code, e.g. `RS`.
    pub fn code(&self) -> &'static str {
        match self {
            MessageType::ReportSubmission => "RS",
            MessageType::ReportInvalid => "RI",
            MessageType::ReportValid => "RV",
            MessageType::ReportDeferred => "RD",
            MessageType::ReportAccepted => "RA",
            MessageType::ReportClosed => "RC",
            MessageType::ReportAck => "RK",
            MessageType::ReportError => "RE",
            MessageType::EmbargoProposal => "EP",
            MessageType::EmbargoRejected => "ER",
            MessageType::EmbargoAccepted => "EA",
            MessageType::EmbargoRevisionProposal => "EV",
            MessageType::EmbargoRevisionRejected => "EJ",
            MessageType::EmbargoRevisionAccepted => "EC",
            MessageType::EmbargoTerminated => "ET",
            MessageType::EmbargoAck => "EK",
            MessageType::EmbargoError => "EE",
            MessageType::VendorAware => "CV",
            MessageType::FixReady => "CF",
            MessageType::FixDeployed => "CD",
            MessageType::PublicAware => "CP",
            MessageType::ExploitPublished => "CX",
            MessageType::AttacksObserved => "CA",
            MessageType::CaseStateAck => "CK",
            MessageType::CaseStateError => "CE",
            MessageType::GeneralInquiry => "GI",
            MessageType::GeneralAck => "GK",
            MessageType::GeneralError => "GE",
        }
    }

    pub fn category(&self) -> MessageCategory {
        use MessageType::*;
        match self {
            ReportSubmission | ReportInvalid | ReportValid | ReportDeferred | ReportAccepted
            | ReportClosed | ReportAck | ReportError => MessageCategory::ReportManagement,
            EmbargoProposal
            | EmbargoRejected
            | EmbargoAccepted
            | EmbargoRevisionProposal
            | EmbargoRevisionRejected
            | EmbargoRevisionAccepted
            | EmbargoTerminated
            | EmbargoAck
            | EmbargoError => MessageCategory::EmbargoManagement,
            VendorAware | FixReady | FixDeployed | PublicAware | ExploitPublished
            | AttacksObserved | CaseStateAck | CaseStateError => MessageCategory::CaseState,
            GeneralInquiry | GeneralAck | GeneralError => MessageCategory::General,
        }
    }

    pub fn is_ack(&self) -> bool {
        matches!(
            self,
            MessageType::ReportAck
                | MessageType::EmbargoAck
                | MessageType::CaseStateAck
                | MessageType::GeneralAck
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            MessageType::ReportError
                | MessageType::EmbargoError
                | MessageType::CaseStateError
                | MessageType::GeneralError
        )
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for MessageType {
    type Err = CvdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageType::ALL
            .into_iter()
            .find(|t| t.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| CvdError::UnknownMessageType(s.to_string()))
    }
}

/// A protocol message. Messages are plain values: the sender keeps its copy
/// in its history and each recipient gets its own clone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub msg_type: MessageType,
    pub sender: String,
    /// Direct recipient, or `None` for the whole case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    pub body: serde_json::Value,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    pub fn new(msg_type: MessageType, sender: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            msg_type,
            sender: sender.into(),
            recipient: None,
            body: serde_json::Value::Null,
            sent_at: Utc::now(),
        }
    }

    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = body;
        self
    }

    pub fn category(&self) -> MessageCategory {
        self.msg_type.category()
    }

    pub fn is_broadcast(&self) -> bool {
        self.recipient.is_none()
    }
}
