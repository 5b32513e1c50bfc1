use actix_web::{
    web::{Data, Query},
    HttpRequest, HttpResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::Instrument;
use validator::Validate;

use crate::models::{FavoriteEntry, RatingEntry};
use crate::stats::{
    activity_by_month, average_rating, favorites_history, rating_history, recent_ratings,
    summarize, DateRange, DEFAULT_RECENT_RATINGS,
};
use crate::store::{FeedbackStore, Store, StoreError};
use crate::util::{
    current_session, missing_session_response, store_error_response, validation_error_response,
};

#[derive(Deserialize, Validate, Debug)]
pub struct RecentQuery {
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<usize>,
}

struct Activity {
    ratings: Vec<RatingEntry>,
    favorites: Vec<FavoriteEntry>,
}

async fn load_activity(store: &dyn Store, user_id: i32) -> Result<Activity, StoreError> {
    let query_span = tracing::info_span!("Loading user activity", user_id);
    async {
        Ok::<Activity, StoreError>(Activity {
            ratings: store.user_ratings(user_id).await?,
            favorites: store.user_favorites(user_id).await?,
        })
    }
    .instrument(query_span)
    .await
}

/// Resolves the viewer and their activity, or the response to send instead.
async fn viewer_activity(
    store: &dyn Store,
    req: &HttpRequest,
    range: &DateRange,
) -> Result<Activity, HttpResponse> {
    if range.is_inverted() {
        tracing::error!("Inverted date range {:?}", range);
        return Err(HttpResponse::BadRequest().json(json!({
            "error": "from must not be after to"
        })));
    }
    let user_id = match current_session(req) {
        Some(session) => session.user.id,
        None => return Err(missing_session_response()),
    };
    load_activity(store, user_id)
        .await
        .map_err(store_error_response)
}

pub async fn get_stats_summary(
    store: Data<dyn Store>,
    range: Query<DateRange>,
    req: HttpRequest,
) -> HttpResponse {
    match viewer_activity(store.get_ref(), &req, &range).await {
        Ok(activity) => HttpResponse::Ok().json(json!({
            "data": summarize(&activity.ratings, &activity.favorites, *range)
        })),
        Err(response) => response,
    }
}

pub async fn get_ratings_history(
    store: Data<dyn Store>,
    range: Query<DateRange>,
    req: HttpRequest,
) -> HttpResponse {
    match viewer_activity(store.get_ref(), &req, &range).await {
        Ok(activity) => HttpResponse::Ok().json(json!({
            "data": rating_history(&activity.ratings, *range)
        })),
        Err(response) => response,
    }
}

pub async fn get_favorites_history(
    store: Data<dyn Store>,
    range: Query<DateRange>,
    req: HttpRequest,
) -> HttpResponse {
    match viewer_activity(store.get_ref(), &req, &range).await {
        Ok(activity) => HttpResponse::Ok().json(json!({
            "data": favorites_history(&activity.favorites, *range)
        })),
        Err(response) => response,
    }
}

pub async fn get_activity_level(
    store: Data<dyn Store>,
    range: Query<DateRange>,
    req: HttpRequest,
) -> HttpResponse {
    match viewer_activity(store.get_ref(), &req, &range).await {
        Ok(activity) => HttpResponse::Ok().json(json!({
            "data": activity_by_month(&activity.ratings, &activity.favorites, *range)
        })),
        Err(response) => response,
    }
}

pub async fn get_average_rating(
    store: Data<dyn Store>,
    range: Query<DateRange>,
    req: HttpRequest,
) -> HttpResponse {
    match viewer_activity(store.get_ref(), &req, &range).await {
        Ok(activity) => HttpResponse::Ok().json(json!({
            "data": {
                "average_rating": average_rating(&activity.ratings, *range)
            }
        })),
        Err(response) => response,
    }
}

pub async fn get_recent_ratings(
    store: Data<dyn Store>,
    info: Query<RecentQuery>,
    req: HttpRequest,
) -> HttpResponse {
    if let Err(error) = info.validate() {
        return validation_error_response(error);
    }
    let limit = info.limit.unwrap_or(DEFAULT_RECENT_RATINGS);
    match viewer_activity(store.get_ref(), &req, &DateRange::default()).await {
        Ok(activity) => HttpResponse::Ok().json(json!({
            "data": recent_ratings(&activity.ratings, limit)
        })),
        Err(response) => response,
    }
}
