mod country;
mod visit;

pub use country::{
    Country, CountryAggregate, CountryDetails, CountrySummary, CountryTally, CuisineOption,
    NewCountry,
};
pub use visit::{NewVisit, Visit, VisitPayload, VisitRefs};
