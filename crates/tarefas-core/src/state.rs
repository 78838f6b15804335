use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Returned when a priority or backlog token is not part of the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {token}")]
pub struct UnknownVariant {
    /// Which enumeration was being parsed.
    pub kind: &'static str,
    /// Offending input.
    pub token: String,
}

/// Task urgency. Declaration order is the sort order (`baixa` lowest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low.
    Baixa,
    /// Medium, the form default.
    #[default]
    Media,
    /// High.
    Alta,
    /// Urgent.
    Urgente,
}

impl Priority {
    /// Every priority, most urgent first.
    pub const DESCENDING: [Self; 4] = [Self::Urgente, Self::Alta, Self::Media, Self::Baixa];

    /// Wire representation stored in the `priority` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Baixa => "baixa",
            Self::Media => "media",
            Self::Alta => "alta",
            Self::Urgente => "urgente",
        }
    }

    /// Human-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Baixa => "Baixa",
            Self::Media => "Média",
            Self::Alta => "Alta",
            Self::Urgente => "Urgente",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "baixa" => Ok(Self::Baixa),
            "media" | "média" => Ok(Self::Media),
            "alta" => Ok(Self::Alta),
            "urgente" => Ok(Self::Urgente),
            _ => Err(UnknownVariant {
                kind: "priority",
                token: s.to_owned(),
            }),
        }
    }
}

/// Workflow stage label attached to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Backlog {
    /// Recurring/fixed-copy work.
    #[serde(rename = "Textos fixos")]
    TextosFixos,
    /// Work in progress.
    #[serde(rename = "Em andamento")]
    EmAndamento,
    /// Not started.
    #[default]
    #[serde(rename = "A fazer")]
    AFazer,
    /// Under test.
    #[serde(rename = "teste")]
    Teste,
    /// Under review.
    #[serde(rename = "revisão")]
    Revisao,
    /// Finished.
    #[serde(rename = "concluido")]
    Concluido,
    /// Blocked or waiting.
    #[serde(rename = "bloqueado")]
    Bloqueado,
}

impl Backlog {
    /// Every backlog stage in board order.
    pub const ALL: [Self; 7] = [
        Self::TextosFixos,
        Self::EmAndamento,
        Self::AFazer,
        Self::Teste,
        Self::Revisao,
        Self::Concluido,
        Self::Bloqueado,
    ];

    /// Wire representation stored in the `backlog` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TextosFixos => "Textos fixos",
            Self::EmAndamento => "Em andamento",
            Self::AFazer => "A fazer",
            Self::Teste => "teste",
            Self::Revisao => "revisão",
            Self::Concluido => "concluido",
            Self::Bloqueado => "bloqueado",
        }
    }
}

impl fmt::Display for Backlog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backlog {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str().to_lowercase() == wanted)
            .ok_or_else(|| UnknownVariant {
                kind: "backlog",
                token: s.to_owned(),
            })
    }
}
