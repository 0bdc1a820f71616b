// libs/business-cell/src/services/business.rs
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Business, BusinessError, BusinessSearchQuery};

pub struct BusinessService {
    supabase: SupabaseClient,
}

impl BusinessService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Fetch a single business profile by id.
    pub async fn get_business(
        &self,
        business_id: Uuid,
        auth_token: &str,
    ) -> Result<Business, BusinessError> {
        debug!("Fetching business: {}", business_id);

        let path = format!("/rest/v1/businesses?id=eq.{}", business_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BusinessError::DatabaseError(e.to_string()))?;

        let Some(row) = result.into_iter().next() else {
            return Err(BusinessError::NotFound);
        };

        serde_json::from_value(row)
            .map_err(|e| BusinessError::DatabaseError(format!("Failed to parse business: {}", e)))
    }

    /// Search active businesses in the directory, best-rated first.
    pub async fn search_businesses(
        &self,
        query: &BusinessSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<Business>, BusinessError> {
        debug!("Searching businesses with filters: {:?}", query);

        let mut query_parts = vec!["is_active=eq.true".to_string()];

        if let Some(ref q) = query.q {
            query_parts.push(format!("name=ilike.*{}*", q));
        }
        if let Some(ref city) = query.city {
            query_parts.push(format!("city=eq.{}", city));
        }
        if let Some(ref tag) = query.tag {
            // PostgREST array-contains filter; braces must be pre-encoded
            query_parts.push(format!("tags=cs.%7B{}%7D", tag));
        }

        query_parts.push(format!("limit={}", query.limit.unwrap_or(20)));
        query_parts.push(format!("offset={}", query.offset.unwrap_or(0)));

        let path = format!(
            "/rest/v1/businesses?{}&order=rating.desc",
            query_parts.join("&")
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BusinessError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Business>, _>>()
            .map_err(|e| BusinessError::DatabaseError(format!("Failed to parse businesses: {}", e)))
    }
}
