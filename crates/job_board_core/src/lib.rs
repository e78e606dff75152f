pub mod domain;
pub mod ports;

pub use domain::{
    Analytics, ApplicantSummary, Application, ApplicationDetails, ApplicationStatus,
    ApplicationUpdate, Company, ExternalJob, Job, JobFilter, JobListing, JobPatch, JobSummary,
    JobType, NewApplication, NewJob, NewUser, Page, Paginated, PostedJob, ProfilePatch, Resume,
    Role, User, UserCredentials, UserFilter,
};
pub use ports::{
    DatabaseService, ExternalJobService, FileStorageService, PortError, PortResult,
};
