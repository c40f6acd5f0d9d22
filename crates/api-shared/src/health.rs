use crate::dto::HealthRes;

/// Health service shared by the API front-ends.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }

    /// Reports the service as healthy.
    ///
    /// The case store is not checked; a store outage surfaces on the requests that need it.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Triage service is alive".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_health_reports_ok() {
        let res = HealthService::check_health();
        assert!(res.ok);
        assert_eq!(res.message, "Triage service is alive");
    }
}
