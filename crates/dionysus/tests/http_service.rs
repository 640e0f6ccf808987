//! Integration tests for the HTTP recipe client against a mock API.
//!
//! wiremock serves canned responses so the client's request shapes and
//! error mapping can be checked without a running recipe service.

use std::time::Duration;

use dionysus::{DionysusError, HttpRecipeService, MatchRequest, RecipeService, SortDirection};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> HttpRecipeService {
    HttpRecipeService::new(&format!("{}/api", server.uri()), Duration::from_secs(5))
}

fn match_json(id: &str, total: u32, owned: u32, missing: &[&str]) -> serde_json::Value {
    json!({
        "id": id,
        "title": format!("Recipe {}", id),
        "description": "",
        "image_url": "",
        "total_ingredients": total,
        "owned_count": owned,
        "missing_count": total - owned,
        "missing_ingredients": missing,
        "sweetness": 1,
        "sourness": 2,
        "strength": 3,
        "tags": ["sweet"],
        "glassware": "Coupe",
        "method": "Shaken"
    })
}

#[tokio::test]
async fn test_match_cocktails_posts_filter() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/match-cocktails"))
        .and(body_json(json!({
            "owned_ingredient_ids": ["gin", "lime"],
            "min_strength": 2,
            "tag_ids": ["sour"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            match_json("gimlet", 3, 3, &[]),
            match_json("daiquiri", 3, 2, &["rum"])
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let request = MatchRequest {
        owned_ingredient_ids: vec!["gin".into(), "lime".into()],
        min_strength: 2,
        tag_ids: vec!["sour".into()],
    };
    let results = client(&server).match_cocktails(&request).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "gimlet");
    assert_eq!(results[1].single_missing(), Some("rum"));
    assert!(results.iter().all(|r| r.check_invariants().is_empty()));
}

#[tokio::test]
async fn test_match_cocktails_null_body_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/match-cocktails"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("null", "application/json"))
        .mount(&server)
        .await;

    let results = client(&server)
        .match_cocktails(&MatchRequest::default())
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_server_error_maps_to_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/match-cocktails"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"error": "database unavailable"})),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .match_cocktails(&MatchRequest::default())
        .unwrap_err();
    match err {
        DionysusError::Status { code, message } => {
            assert_eq!(code, 500);
            assert_eq!(message, "database unavailable");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_maps_to_decode() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/ingredients"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client(&server).ingredients().unwrap_err();
    assert!(matches!(err, DionysusError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_server_maps_to_transport() {
    // Nothing listens on port 9 on a test machine
    let service = HttpRecipeService::new("http://127.0.0.1:9/api", Duration::from_secs(1));
    let err = service.tags().unwrap_err();
    assert!(matches!(err, DionysusError::Transport(_)));
}

#[tokio::test]
async fn test_reference_data() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/ingredients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "gin", "name": "Gin", "category": "Spirit"},
            {"id": "lime", "name": "Lime Juice", "category": "Mixer"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "sour", "name": "Sour", "type": "Palate"}
        ])))
        .mount(&server)
        .await;

    let catalog = dionysus::Catalog::fetch(&client(&server)).unwrap();
    assert_eq!(catalog.ingredient_name("lime"), "Lime Juice");
    assert_eq!(catalog.tags_of_kind("Palate").count(), 1);
}

#[tokio::test]
async fn test_recipes_page_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/recipes"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "12"))
        .and(query_param("sort", "asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "r1", "title": "Gimlet", "strength": 3}],
            "total": 13
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client(&server).recipes(2, 12, SortDirection::Asc).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total, 13);
    assert!(!page.has_more(12, 13));
}

#[tokio::test]
async fn test_recipe_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/recipes/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Recipe not found"})))
        .mount(&server)
        .await;

    let err = client(&server).recipe("missing").unwrap_err();
    assert!(matches!(err, DionysusError::NotFound(_)));
}

#[tokio::test]
async fn test_recipe_detail() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/recipes/r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "r1",
            "title": "Gimlet",
            "glassware": "Coupe",
            "method": "Shaken",
            "steps": "Shake with ice. Strain.",
            "ingredients": [
                {"ingredient_id": "gin", "name": "Gin", "amount": "60", "unit": "ml"},
                {"ingredient_id": "lime", "amount": "20", "unit": "ml"}
            ],
            "tags": [{"id": "sour", "name": "Sour", "type": "Palate"}]
        })))
        .mount(&server)
        .await;

    let recipe = client(&server).recipe("r1").unwrap();
    assert_eq!(recipe.title, "Gimlet");
    let ingredients = recipe.ingredients.unwrap();
    assert_eq!(ingredients.len(), 2);
    assert_eq!(ingredients[1].name, None);
    assert_eq!(recipe.tags.unwrap()[0].kind, "Palate");
}

#[tokio::test]
async fn test_recipe_id_stays_in_one_path_segment() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/recipes/a%2Fb%3Fc%23d"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "a/b?c#d",
            "title": "Odd One"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let recipe = client(&server).recipe("a/b?c#d").unwrap();
    assert_eq!(recipe.title, "Odd One");
}
