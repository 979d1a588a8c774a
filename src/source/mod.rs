// src/source/mod.rs
pub mod load;

pub use load::{load_sources, RawTable};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Column holding the region name in every source file.
pub const REGION_COLUMN: &str = "region";
/// Column holding the measured percentage in every source file.
pub const PERCENTAGE_COLUMN: &str = "valor_porcentaje";
/// Census label column ("Censo 2007", ...) carried by the INEI sources.
pub const CENSUS_COLUMN: &str = "censo";
/// Survey year stamped on every ENE row.
pub const ENE_SURVEY_YEAR: u16 = 2017;

/// Survey family a source file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataOrigin {
    #[serde(rename = "INEI")]
    Inei,
    #[serde(rename = "ENE")]
    Ene,
}

impl DataOrigin {
    /// Integer code stored in the fact table.
    pub fn code(self) -> u8 {
        match self {
            DataOrigin::Inei => 1,
            DataOrigin::Ene => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DataOrigin::Inei => "INEI",
            DataOrigin::Ene => "ENE",
        }
    }
}

impl fmt::Display for DataOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a source's `year` comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearRule {
    /// Last four characters of the named census label column.
    CensusLabel(&'static str),
    /// Constant for every row.
    Fixed(u16),
}

/// Static description of one source file.
#[derive(Debug)]
pub struct SourceLayout {
    pub index: u8,
    pub label: &'static str,
    pub origin: DataOrigin,
    pub year: YearRule,
    /// 0-based position of the response category column.
    pub response_column: usize,
}

const fn inei(index: u8, label: &'static str) -> SourceLayout {
    SourceLayout {
        index,
        label,
        origin: DataOrigin::Inei,
        year: YearRule::CensusLabel(CENSUS_COLUMN),
        response_column: 2,
    }
}

const fn ene(index: u8, label: &'static str) -> SourceLayout {
    SourceLayout {
        index,
        label,
        origin: DataOrigin::Ene,
        year: YearRule::Fixed(ENE_SURVEY_YEAR),
        response_column: 1,
    }
}

// Order matches the `SourceId` discriminants.
static LAYOUTS: [SourceLayout; 8] = [
    inei(1, "Acceso a TIC"),
    inei(2, "Acceso a Internet"),
    inei(3, "Acceso a TV Cable"),
    inei(4, "Tipo de Teléfono"),
    ene(5, "Empleó Equipos Informáticos"),
    ene(6, "Usó Internet"),
    ene(7, "Usó Internet para buscar Productos y Servicios"),
    ene(8, "Tuvo Problemas de Electricidad"),
];

/// One of the eight survey questions, numbered 1..=8 on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceId {
    TicAccess,
    InternetAccess,
    CableTv,
    PhoneType,
    ComputerUse,
    InternetUse,
    ProductSearch,
    PowerOutages,
}

impl SourceId {
    pub const ALL: [SourceId; 8] = [
        SourceId::TicAccess,
        SourceId::InternetAccess,
        SourceId::CableTv,
        SourceId::PhoneType,
        SourceId::ComputerUse,
        SourceId::InternetUse,
        SourceId::ProductSearch,
        SourceId::PowerOutages,
    ];

    pub fn layout(self) -> &'static SourceLayout {
        &LAYOUTS[self as usize]
    }

    /// 1-based index embedded in the file name.
    pub fn index(self) -> u8 {
        self.layout().index
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.index() == index)
    }

    /// Survey question text stored as `variable`.
    pub fn label(self) -> &'static str {
        self.layout().label
    }

    pub fn origin(self) -> DataOrigin {
        self.layout().origin
    }

    pub fn file_name(self) -> String {
        format!("chart{}.csv", self.index())
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chart{}", self.index())
    }
}
