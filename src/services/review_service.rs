use chrono::Utc;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::reviews::{CreateReviewRequest, ReviewList},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Product, Review},
    response::{ApiResponse, Meta},
    services::{auth_service::load_users, product_service::find_product},
    state::AppState,
    store::{keys, load_list, save_list},
};

pub async fn list_reviews(state: &AppState, product_id: Uuid) -> AppResult<ApiResponse<ReviewList>> {
    find_product(state, product_id).await?;
    let mut items: Vec<Review> = load_list::<Review>(state.store.as_ref(), keys::REVIEWS)
        .await?
        .into_iter()
        .filter(|r| r.product_id == product_id)
        .collect();
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Reviews", ReviewList { items }, Some(meta)))
}

/// Store a review and refresh the product's rating and review count.
pub async fn add_review(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::BadRequest("rating must be between 1 and 5".into()));
    }

    let author = load_users(state)
        .await?
        .into_iter()
        .find(|u| u.id == user.user_id)
        .ok_or_else(|| AppError::Unauthorized("Unknown user".into()))?;

    let (review, product) = {
        let _gate = state.write_gate.lock().await;
        let mut products: Vec<Product> = load_list(state.store.as_ref(), keys::PRODUCTS).await?;
        let product = products
            .iter_mut()
            .find(|p| p.id == product_id)
            .ok_or(AppError::NotFound)?;

        let review = Review {
            id: Uuid::new_v4(),
            product_id,
            user_id: author.id,
            user_name: author.name,
            rating: payload.rating,
            comment: payload.comment.trim().to_string(),
            created_at: Utc::now(),
        };

        let mut reviews: Vec<Review> = load_list(state.store.as_ref(), keys::REVIEWS).await?;
        reviews.push(review.clone());

        let ratings: Vec<u8> = reviews
            .iter()
            .filter(|r| r.product_id == product_id)
            .map(|r| r.rating)
            .collect();
        product.rating = average_rating(&ratings);
        product.review_count = ratings.len() as u32;
        let product = product.clone();

        save_list(state.store.as_ref(), keys::REVIEWS, &reviews).await?;
        save_list(state.store.as_ref(), keys::PRODUCTS, &products).await?;
        (review, product)
    };

    log_audit(
        Some(user.user_id),
        "review_create",
        Some("reviews"),
        Some(serde_json::json!({
            "product_id": product.id,
            "rating": review.rating,
            "product_rating": product.rating,
        })),
    );

    Ok(ApiResponse::success(
        "Review added",
        review,
        Some(Meta::empty()),
    ))
}

/// Mean rating rounded to one decimal place.
fn average_rating(ratings: &[u8]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: u32 = ratings.iter().map(|&r| u32::from(r)).sum();
    let mean = f64::from(sum) / ratings.len() as f64;
    (mean * 10.0).round() / 10.0
}
