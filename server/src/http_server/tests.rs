use axum::http::{header, Method, StatusCode};
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use super::test_helpers::{
    create_ingredient, create_tag, create_test_app, create_user, request, response_body_json,
    response_body_text, send,
};

async fn post_recipe(
    app: &axum::Router,
    token: &str,
    name: &str,
    ingredients: &[(Uuid, i32)],
    tags: &[Uuid],
) -> Value {
    let body = json!({
        "name": name,
        "text": "Mix everything, then bake.",
        "cooking_time": 25,
        "ingredients": ingredients
            .iter()
            .map(|(id, amount)| json!({ "id": id, "amount": amount }))
            .collect::<Vec<_>>(),
        "tags": tags,
    });

    let response = send(app, request(Method::POST, "/api/recipes/", Some(token), Some(body))).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    response_body_json(response).await
}

fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

#[sqlx::test(migrations = "../db/migrations")]
async fn shopping_list_sums_the_cart(pool: PgPool) {
    let app = create_test_app(pool.clone());
    let (_, token) = create_user(&pool, "cook").await;
    let flour = create_ingredient(&pool, "Flour", "g").await;
    let sugar = create_ingredient(&pool, "Sugar", "g").await;
    let tag = create_tag(&pool, "Baking").await;

    let a = post_recipe(
        &app,
        &token,
        "Cake",
        &[(flour.ingredient_id, 200), (sugar.ingredient_id, 50)],
        &[tag.tag_id],
    )
    .await;
    let b = post_recipe(&app, &token, "Bread", &[(flour.ingredient_id, 100)], &[tag.tag_id]).await;

    let empty = send(
        &app,
        request(Method::GET, "/api/recipes/download_shopping_cart/", Some(&token), None),
    )
    .await;
    assert_eq!(empty.status(), StatusCode::OK);
    assert_eq!(response_body_text(empty).await, "");

    for recipe in [&a, &b] {
        let uri = format!("/api/recipes/{}/shopping_cart/", id_of(recipe));
        let response = send(&app, request(Method::POST, &uri, Some(&token), None)).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let summary: Value = response_body_json(response).await;
        assert_eq!(summary["id"], recipe["id"]);
        assert_eq!(summary["cooking_time"], 25);
    }

    let response = send(
        &app,
        request(Method::GET, "/api/recipes/download_shopping_cart/", Some(&token), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"shopping_list.txt\""
    );
    assert_eq!(
        response_body_text(response).await,
        "Flour (g) — 300\nSugar (g) — 50\n"
    );

    let response = send(
        &app,
        request(
            Method::GET,
            "/api/recipes/download_shopping_cart/?format=csv",
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"shopping_list.csv\""
    );
    assert_eq!(
        response_body_text(response).await,
        "ingredient,measurement_unit,amount\nFlour,g,300\nSugar,g,50\n"
    );

    let uri = format!("/api/recipes/{}/shopping_cart/", id_of(&a));
    let response = send(&app, request(Method::DELETE, &uri, Some(&token), None)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(
        &app,
        request(
            Method::GET,
            "/api/recipes/download_shopping_cart/?format=json",
            Some(&token),
            None,
        ),
    )
    .await;
    let body: Value = response_body_json(response).await;
    assert_eq!(
        body,
        json!({
            "items": [{ "name": "Flour", "measurement_unit": "g", "amount": 100 }],
            "total": 1
        })
    );

    let response = send(
        &app,
        request(
            Method::GET,
            "/api/recipes/download_shopping_cart/?format=pdf",
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"shopping_list.pdf\""
    );
    let pdf = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn download_needs_a_known_user_and_format(pool: PgPool) {
    let app = create_test_app(pool.clone());
    let (_, token) = create_user(&pool, "cook").await;

    let anonymous = send(
        &app,
        request(Method::GET, "/api/recipes/download_shopping_cart/", None, None),
    )
    .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let unknown_token = send(
        &app,
        request(
            Method::GET,
            "/api/recipes/download_shopping_cart/",
            Some("not-a-token"),
            None,
        ),
    )
    .await;
    assert_eq!(unknown_token.status(), StatusCode::UNAUTHORIZED);

    let bad_format = send(
        &app,
        request(
            Method::GET,
            "/api/recipes/download_shopping_cart/?format=xlsx",
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(bad_format.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn cart_and_favorite_errors(pool: PgPool) {
    let app = create_test_app(pool.clone());
    let (_, token) = create_user(&pool, "cook").await;
    let flour = create_ingredient(&pool, "Flour", "g").await;
    let tag = create_tag(&pool, "Baking").await;
    let recipe = post_recipe(&app, &token, "Bread", &[(flour.ingredient_id, 100)], &[tag.tag_id]).await;

    let cart = format!("/api/recipes/{}/shopping_cart/", id_of(&recipe));
    assert_eq!(
        send(&app, request(Method::POST, &cart, Some(&token), None)).await.status(),
        StatusCode::CREATED
    );
    let duplicate = send(&app, request(Method::POST, &cart, Some(&token), None)).await;
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);
    let body: Value = response_body_json(duplicate).await;
    assert_eq!(body["detail"], "Recipe is already in the shopping cart");

    let favorite = format!("/api/recipes/{}/favorite/", id_of(&recipe));
    let absent = send(&app, request(Method::DELETE, &favorite, Some(&token), None)).await;
    assert_eq!(absent.status(), StatusCode::BAD_REQUEST);

    let missing = format!("/api/recipes/{}/favorite/", Uuid::new_v4());
    let unknown = send(&app, request(Method::POST, &missing, Some(&token), None)).await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let anonymous = send(&app, request(Method::POST, &favorite, None, None)).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn recipe_representation_reflects_the_viewer(pool: PgPool) {
    let app = create_test_app(pool.clone());
    let (author, author_token) = create_user(&pool, "author").await;
    let (_, reader_token) = create_user(&pool, "reader").await;
    let eggs = create_ingredient(&pool, "Eggs", "pcs").await;
    let milk = create_ingredient(&pool, "Milk", "ml").await;
    let tag = create_tag(&pool, "Breakfast").await;

    let recipe = post_recipe(
        &app,
        &author_token,
        "Omelette",
        &[(eggs.ingredient_id, 3), (milk.ingredient_id, 50)],
        &[tag.tag_id],
    )
    .await;
    assert_eq!(recipe["author"]["id"], json!(author.user_id));
    assert_eq!(recipe["ingredients"][0]["name"], "Eggs");
    assert_eq!(recipe["ingredients"][1]["amount"], 50);
    assert_eq!(recipe["tags"][0]["slug"], "breakfast");

    let uri = format!("/api/recipes/{}/", id_of(&recipe));
    send(
        &app,
        request(
            Method::POST,
            &format!("/api/recipes/{}/favorite/", id_of(&recipe)),
            Some(&reader_token),
            None,
        ),
    )
    .await;
    send(
        &app,
        request(
            Method::POST,
            &format!("/api/users/{}/subscribe/", author.user_id),
            Some(&reader_token),
            None,
        ),
    )
    .await;

    let seen_by_reader: Value =
        response_body_json(send(&app, request(Method::GET, &uri, Some(&reader_token), None)).await)
            .await;
    assert_eq!(seen_by_reader["is_favorited"], true);
    assert_eq!(seen_by_reader["is_in_shopping_cart"], false);
    assert_eq!(seen_by_reader["author"]["is_subscribed"], true);

    let seen_anonymously: Value =
        response_body_json(send(&app, request(Method::GET, &uri, None, None)).await).await;
    assert_eq!(seen_anonymously["is_favorited"], false);
    assert_eq!(seen_anonymously["author"]["is_subscribed"], false);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn only_the_author_may_change_a_recipe(pool: PgPool) {
    let app = create_test_app(pool.clone());
    let (_, author_token) = create_user(&pool, "author").await;
    let (_, other_token) = create_user(&pool, "other").await;
    let flour = create_ingredient(&pool, "Flour", "g").await;
    let tag = create_tag(&pool, "Baking").await;
    let recipe = post_recipe(&app, &author_token, "Bread", &[(flour.ingredient_id, 500)], &[tag.tag_id]).await;
    let uri = format!("/api/recipes/{}/", id_of(&recipe));

    let patch = json!({
        "name": "Rye bread",
        "text": "Knead longer.",
        "cooking_time": 90,
        "ingredients": [{ "id": flour.ingredient_id, "amount": 400 }],
        "tags": [tag.tag_id],
    });

    let forbidden = send(
        &app,
        request(Method::PATCH, &uri, Some(&other_token), Some(patch.clone())),
    )
    .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
    let forbidden = send(&app, request(Method::DELETE, &uri, Some(&other_token), None)).await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let updated = send(
        &app,
        request(Method::PATCH, &uri, Some(&author_token), Some(patch)),
    )
    .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let updated: Value = response_body_json(updated).await;
    assert_eq!(updated["name"], "Rye bread");
    assert_eq!(updated["ingredients"][0]["amount"], 400);

    let deleted = send(&app, request(Method::DELETE, &uri, Some(&author_token), None)).await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    let gone = send(&app, request(Method::GET, &uri, None, None)).await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn invalid_recipes_list_every_problem(pool: PgPool) {
    let app = create_test_app(pool.clone());
    let (_, token) = create_user(&pool, "cook").await;
    let flour = create_ingredient(&pool, "Flour", "g").await;

    let body = json!({
        "name": "Nothing",
        "text": "Empty.",
        "cooking_time": 0,
        "ingredients": [
            { "id": flour.ingredient_id, "amount": 1 },
            { "id": flour.ingredient_id, "amount": 2 }
        ],
        "tags": [],
    });

    let response = send(&app, request(Method::POST, "/api/recipes/", Some(&token), Some(body))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let errors: Value = response_body_json(response).await;
    assert!(errors["cooking_time"].is_array());
    assert!(errors["ingredients"].is_array());
    assert!(errors["tags"].is_array());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn malformed_recipe_bodies_are_bad_requests(pool: PgPool) {
    let app = create_test_app(pool.clone());
    let (_, token) = create_user(&pool, "cook").await;

    let missing_tags = json!({
        "name": "x",
        "text": "y",
        "cooking_time": 5,
        "ingredients": [],
    });
    let response = send(
        &app,
        request(Method::POST, "/api/recipes/", Some(&token), Some(missing_tags)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response_body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("tags"));

    let wrong_type = json!({
        "name": "x",
        "text": "y",
        "cooking_time": "soon",
        "ingredients": [],
        "tags": [],
    });
    let response = send(
        &app,
        request(Method::POST, "/api/recipes/", Some(&token), Some(wrong_type)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn recipe_list_filters_and_pages(pool: PgPool) {
    let app = create_test_app(pool.clone());
    let (author, token) = create_user(&pool, "cook").await;
    let flour = create_ingredient(&pool, "Flour", "g").await;
    let lunch = create_tag(&pool, "Lunch").await;
    let dinner = create_tag(&pool, "Dinner").await;

    let mut lunch_ids = vec![];
    for n in 0..3 {
        let recipe = post_recipe(
            &app,
            &token,
            &format!("Lunch {n}"),
            &[(flour.ingredient_id, 100)],
            &[lunch.tag_id],
        )
        .await;
        lunch_ids.push(id_of(&recipe));
    }
    let supper = post_recipe(&app, &token, "Supper", &[(flour.ingredient_id, 100)], &[dinner.tag_id]).await;

    let page: Value = response_body_json(
        send(
            &app,
            request(Method::GET, "/api/recipes/?tags=lunch&limit=2", None, None),
        )
        .await,
    )
    .await;
    assert_eq!(page["count"], 3);
    assert_eq!(page["results"].as_array().unwrap().len(), 2);
    assert_eq!(page["results"][0]["id"], json!(lunch_ids[2]));
    assert_eq!(
        page["next"],
        "http://localhost:3000/api/recipes/?tags=lunch&limit=2&page=2"
    );
    assert_eq!(page["previous"], Value::Null);

    let both: Value = response_body_json(
        send(
            &app,
            request(Method::GET, "/api/recipes/?tags=lunch&tags=dinner", None, None),
        )
        .await,
    )
    .await;
    assert_eq!(both["count"], 4);

    let by_author: Value = response_body_json(
        send(
            &app,
            request(
                Method::GET,
                &format!("/api/recipes/?author={}", author.user_id),
                None,
                None,
            ),
        )
        .await,
    )
    .await;
    assert_eq!(by_author["count"], 4);

    send(
        &app,
        request(
            Method::POST,
            &format!("/api/recipes/{}/shopping_cart/", id_of(&supper)),
            Some(&token),
            None,
        ),
    )
    .await;
    let in_cart: Value = response_body_json(
        send(
            &app,
            request(Method::GET, "/api/recipes/?is_in_shopping_cart=1", Some(&token), None),
        )
        .await,
    )
    .await;
    assert_eq!(in_cart["count"], 1);
    assert_eq!(in_cart["results"][0]["is_in_shopping_cart"], true);

    let anonymous: Value = response_body_json(
        send(
            &app,
            request(Method::GET, "/api/recipes/?is_in_shopping_cart=1", None, None),
        )
        .await,
    )
    .await;
    assert_eq!(anonymous["count"], 4);

    let by_name: Value = response_body_json(
        send(
            &app,
            request(Method::GET, "/api/recipes/?name=SUPP", None, None),
        )
        .await,
    )
    .await;
    assert_eq!(by_name["count"], 1);
    assert_eq!(by_name["results"][0]["id"], json!(id_of(&supper)));

    let past_the_end = send(&app, request(Method::GET, "/api/recipes/?page=5", None, None)).await;
    assert_eq!(past_the_end.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn subscriptions_round_trip(pool: PgPool) {
    let app = create_test_app(pool.clone());
    let (reader, reader_token) = create_user(&pool, "reader").await;
    let (author, author_token) = create_user(&pool, "author").await;
    let flour = create_ingredient(&pool, "Flour", "g").await;
    let tag = create_tag(&pool, "Baking").await;
    for name in ["Bagels", "Brioche", "Focaccia"] {
        post_recipe(&app, &author_token, name, &[(flour.ingredient_id, 250)], &[tag.tag_id]).await;
    }

    let own = format!("/api/users/{}/subscribe/", reader.user_id);
    let response = send(&app, request(Method::POST, &own, Some(&reader_token), None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let subscribe = format!("/api/users/{}/subscribe/?recipes_limit=2", author.user_id);
    let response = send(&app, request(Method::POST, &subscribe, Some(&reader_token), None)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response_body_json(response).await;
    assert_eq!(body["username"], "author");
    assert_eq!(body["is_subscribed"], true);
    assert_eq!(body["recipes_count"], 3);
    assert_eq!(body["recipes"].as_array().unwrap().len(), 2);
    assert_eq!(body["recipes"][0]["name"], "Focaccia");

    let again = send(&app, request(Method::POST, &subscribe, Some(&reader_token), None)).await;
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);

    let unknown = format!("/api/users/{}/subscribe/", Uuid::new_v4());
    let response = send(&app, request(Method::POST, &unknown, Some(&reader_token), None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let list: Value = response_body_json(
        send(
            &app,
            request(
                Method::GET,
                "/api/users/subscriptions/?recipes_limit=1",
                Some(&reader_token),
                None,
            ),
        )
        .await,
    )
    .await;
    assert_eq!(list["count"], 1);
    assert_eq!(list["results"][0]["id"], json!(author.user_id));
    assert_eq!(list["results"][0]["recipes"].as_array().unwrap().len(), 1);

    let unsubscribe = format!("/api/users/{}/subscribe/", author.user_id);
    let response = send(
        &app,
        request(Method::DELETE, &unsubscribe, Some(&reader_token), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = send(
        &app,
        request(Method::DELETE, &unsubscribe, Some(&reader_token), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn users_and_reference_data(pool: PgPool) {
    let app = create_test_app(pool.clone());
    let (me, token) = create_user(&pool, "me").await;
    create_ingredient(&pool, "Sugar", "g").await;
    create_ingredient(&pool, "Salt", "g").await;
    let tag = create_tag(&pool, "Dessert").await;

    let profile: Value =
        response_body_json(send(&app, request(Method::GET, "/api/users/me/", Some(&token), None)).await)
            .await;
    assert_eq!(profile["id"], json!(me.user_id));
    assert_eq!(
        send(&app, request(Method::GET, "/api/users/me/", None, None)).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let users: Value =
        response_body_json(send(&app, request(Method::GET, "/api/users/", None, None)).await).await;
    assert_eq!(users["count"], 1);

    let found: Value = response_body_json(
        send(&app, request(Method::GET, "/api/ingredients/?name=su", None, None)).await,
    )
    .await;
    assert_eq!(found, json!([{ "id": found[0]["id"], "name": "Sugar", "measurement_unit": "g" }]));

    let tag_uri = format!("/api/tags/{}/", tag.tag_id);
    let fetched: Value =
        response_body_json(send(&app, request(Method::GET, &tag_uri, None, None)).await).await;
    assert_eq!(fetched["slug"], "dessert");

    let missing = format!("/api/ingredients/{}/", Uuid::new_v4());
    assert_eq!(
        send(&app, request(Method::GET, &missing, None, None)).await.status(),
        StatusCode::NOT_FOUND
    );

    let versions: Value =
        response_body_json(send(&app, request(Method::GET, "/_", None, None)).await).await;
    assert_eq!(versions["version"], "test-version");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn get_link_points_at_the_recipe(pool: PgPool) {
    let app = create_test_app(pool.clone());
    let (_, token) = create_user(&pool, "cook").await;
    let flour = create_ingredient(&pool, "Flour", "g").await;
    let tag = create_tag(&pool, "Baking").await;
    let recipe = post_recipe(&app, &token, "Bread", &[(flour.ingredient_id, 100)], &[tag.tag_id]).await;

    let uri = format!("/api/recipes/{}/get-link/", id_of(&recipe));
    let response = send(&app, request(Method::GET, &uri, None, None)).await;
    let link: Value = response_body_json(response).await;

    assert_eq!(
        link["short-link"],
        format!("http://localhost:3000/api/recipes/{}/", id_of(&recipe))
    );
}
