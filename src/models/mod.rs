// Model exports
pub mod domain;
pub mod lenient;
pub mod requests;
pub mod responses;

pub use domain::{
    DailySession, ImportedMemory, InsightKind, InsightRecord, MatchCandidate, Profile, ProfileUpdate,
    ScoringPolicy, ScoringRules,
};
pub use requests::{
    CreateConnectionRequest, FindMatchesRequest, InsightsRequest, MatchRequest, MemoryImportRequest,
    UpdateProfileRequest,
};
pub use responses::{
    CacheStats, CreateConnectionResponse, ErrorResponse, FindMatchesResponse, HealthResponse,
    MemoryImportResponse, ProfileResponse, RankResponse, SearchCriteria, TargetUser,
};
