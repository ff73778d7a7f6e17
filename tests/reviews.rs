mod common;

use rust_decimal::Decimal;
use storefront_api::{
    dto::reviews::CreateReviewRequest,
    error::AppError,
    services::{product_service, review_service},
};
use uuid::Uuid;

fn review(rating: u8, comment: &str) -> CreateReviewRequest {
    CreateReviewRequest {
        rating,
        comment: comment.into(),
    }
}

#[tokio::test]
async fn reviews_update_product_rating() -> anyhow::Result<()> {
    let state = common::test_state();
    let admin = common::default_admin(&state).await;
    let anu = common::register_customer(&state, "anu@example.com", "Anu").await;
    let bikash = common::register_customer(&state, "bikash@example.com", "Bikash").await;
    let product = common::add_product(&state, &admin, "Highlighter", Decimal::new(650, 0), 9).await;

    let first = review_service::add_review(&state, &anu, product.id, review(5, " Lovely glow "))
        .await?
        .data
        .expect("review");
    assert_eq!(first.user_name, "Anu");
    assert_eq!(first.comment, "Lovely glow");

    review_service::add_review(&state, &bikash, product.id, review(4, "Good")).await?;
    review_service::add_review(&state, &bikash, product.id, review(4, "Still good")).await?;

    let updated = product_service::get_product(&state, product.id)
        .await?
        .data
        .expect("product");
    assert_eq!(updated.review_count, 3);
    assert_eq!(updated.rating, 4.3);

    let listed = review_service::list_reviews(&state, product.id)
        .await?
        .data
        .expect("reviews")
        .items;
    assert_eq!(listed.len(), 3);
    assert!(listed.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    assert!(listed.iter().all(|r| r.product_id == product.id));
    Ok(())
}

#[tokio::test]
async fn invalid_reviews_are_rejected() -> anyhow::Result<()> {
    let state = common::test_state();
    let admin = common::default_admin(&state).await;
    let user = common::register_customer(&state, "critic@example.com", "Critic").await;
    let product = common::add_product(&state, &admin, "Toner", Decimal::new(400, 0), 3).await;

    for rating in [0, 6] {
        let result = review_service::add_review(&state, &user, product.id, review(rating, "")).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    let missing = review_service::add_review(&state, &user, Uuid::new_v4(), review(3, "")).await;
    assert!(matches!(missing, Err(AppError::NotFound)));

    let listing = review_service::list_reviews(&state, Uuid::new_v4()).await;
    assert!(matches!(listing, Err(AppError::NotFound)));

    let untouched = product_service::get_product(&state, product.id)
        .await?
        .data
        .expect("product");
    assert_eq!(untouched.review_count, 0);
    assert_eq!(untouched.rating, product_service::INITIAL_RATING);
    Ok(())
}
