mod playlist;
mod report;
mod token;

pub use playlist::{
    hash_key, ContentType, Playlist, PlaylistRecord, PlaylistStats, ProviderFields, SeriesGroup,
    UNGROUPED_LABEL,
};
pub use report::{ParseReport, ParseStatistics, ParseWarning, WarningKind, WarningSeverity};
pub use token::{ExtInf, Token};
