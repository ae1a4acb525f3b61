use std::path::PathBuf;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    Engine, EngineError, IngredientAmount, IngredientRecord, RecipeCreateCmd, RecipeListFilter,
    RecipeOrder, RecipeUpdateCmd,
};
use migration::MigratorTrait;
use uuid::Uuid;

const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

struct Fixture {
    engine: Engine,
    _db: DatabaseConnection,
    media: PathBuf,
    flour: i32,
    sugar: i32,
    egg: i32,
    breakfast: i32,
    dinner: i32,
}

async fn add_user(db: &DatabaseConnection, username: &str) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password) VALUES (?, ?)",
        vec![username.into(), "password".into()],
    ))
    .await
    .unwrap();
}

async fn fixture() -> Fixture {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    add_user(&db, "alice").await;
    add_user(&db, "bob").await;

    let engine = Engine::builder()
        .database(db.clone())
        .media_root(
            PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .join("../../target/test_media")
                .join(Uuid::new_v4().to_string()),
        )
        .build()
        .await
        .unwrap();
    let media = engine.media_root().to_path_buf();

    engine
        .import_ingredients(&[
            record("Flour", "g"),
            record("Sugar", "g"),
            record("Egg", "pcs"),
        ])
        .await
        .unwrap();
    let id_of = |name: &str, all: &[engine::Ingredient]| {
        all.iter().find(|i| i.name == name).map(|i| i.id).unwrap()
    };
    let all = engine.search_ingredients(None).await.unwrap();
    let (flour, sugar, egg) = (
        id_of("Flour", &all),
        id_of("Sugar", &all),
        id_of("Egg", &all),
    );

    let breakfast = engine
        .create_tag("Breakfast", "#e26c2d", "breakfast")
        .await
        .unwrap()
        .id;
    let dinner = engine
        .create_tag("Dinner", "#49B64E", "dinner")
        .await
        .unwrap()
        .id;

    Fixture {
        engine,
        _db: db,
        media,
        flour,
        sugar,
        egg,
        breakfast,
        dinner,
    }
}

fn record(name: &str, unit: &str) -> IngredientRecord {
    IngredientRecord {
        name: name.to_string(),
        measurement_unit: unit.to_string(),
    }
}

fn amount(ingredient_id: i32, amount: i32) -> IngredientAmount {
    IngredientAmount {
        ingredient_id,
        amount,
    }
}

fn create_cmd(name: &str, ingredients: Vec<IngredientAmount>, tags: Vec<i32>) -> RecipeCreateCmd {
    RecipeCreateCmd {
        name: name.to_string(),
        text: "Mix everything.".to_string(),
        image: PNG.to_string(),
        cooking_time: 10,
        ingredients,
        tags,
    }
}

#[tokio::test]
async fn create_recipe_stores_links_and_image() {
    let f = fixture().await;

    let recipe = f
        .engine
        .create_recipe(
            create_cmd(
                "Pancakes",
                vec![amount(f.flour, 200), amount(f.egg, 2)],
                vec![f.dinner, f.breakfast],
            ),
            "alice",
        )
        .await
        .unwrap();

    assert_eq!(recipe.author, "alice");
    assert_eq!(
        recipe
            .ingredients
            .iter()
            .map(|i| (i.name.as_str(), i.amount))
            .collect::<Vec<_>>(),
        vec![("Flour", 200), ("Egg", 2)]
    );
    assert_eq!(
        recipe.tags.iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![f.breakfast, f.dinner]
    );
    assert_eq!(recipe.tags[0].color, "#E26C2D");
    assert!(!recipe.is_favorited);
    assert!(recipe.image.starts_with("recipes/images/"));
    assert!(f.media.join(&recipe.image).exists());
}

#[tokio::test]
async fn create_recipe_rejects_unknown_ingredient_and_keeps_no_image() {
    let f = fixture().await;

    let err = f
        .engine
        .create_recipe(create_cmd("Ghost", vec![amount(9999, 1)], vec![]), "alice")
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("ingredients"));

    let dir = f.media.join("recipes/images");
    let leftovers = std::fs::read_dir(&dir)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn create_recipe_validation() {
    let f = fixture().await;

    let mut cmd = create_cmd("Toast", vec![amount(f.flour, 1)], vec![]);
    cmd.cooking_time = 0;
    let err = f.engine.create_recipe(cmd.clone(), "alice").await.unwrap_err();
    assert_eq!(err.field(), Some("cooking_time"));

    cmd.cooking_time = 1;
    let recipe = f.engine.create_recipe(cmd, "alice").await.unwrap();
    assert_eq!(recipe.cooking_time, 1);
    assert!(recipe.tags.is_empty());

    let err = f
        .engine
        .create_recipe(
            create_cmd("Twice", vec![amount(f.flour, 1), amount(f.flour, 2)], vec![]),
            "alice",
        )
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("ingredients"));

    let err = f
        .engine
        .create_recipe(
            create_cmd("Tagged", vec![amount(f.flour, 1)], vec![f.dinner, f.dinner]),
            "alice",
        )
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("tags"));

    let mut cmd = create_cmd("No picture", vec![amount(f.flour, 1)], vec![]);
    cmd.image = "not an image".to_string();
    let err = f.engine.create_recipe(cmd, "alice").await.unwrap_err();
    assert_eq!(err.field(), Some("image"));
}

#[tokio::test]
async fn update_replaces_lists_and_keeps_missing_fields() {
    let f = fixture().await;
    let recipe = f
        .engine
        .create_recipe(
            create_cmd("Cake", vec![amount(f.flour, 300)], vec![f.breakfast]),
            "alice",
        )
        .await
        .unwrap();

    let updated = f
        .engine
        .update_recipe(
            recipe.id,
            RecipeUpdateCmd {
                ingredients: Some(vec![amount(f.sugar, 100), amount(f.egg, 3)]),
                tags: Some(vec![]),
                ..Default::default()
            },
            "alice",
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Cake");
    assert_eq!(updated.image, recipe.image);
    assert!(updated.tags.is_empty());
    assert_eq!(
        updated
            .ingredients
            .iter()
            .map(|i| (i.id, i.amount))
            .collect::<Vec<_>>(),
        vec![(f.sugar, 100), (f.egg, 3)]
    );
}

#[tokio::test]
async fn failed_update_leaves_recipe_untouched() {
    let f = fixture().await;
    let recipe = f
        .engine
        .create_recipe(
            create_cmd("Soup", vec![amount(f.egg, 1)], vec![f.dinner]),
            "alice",
        )
        .await
        .unwrap();

    let err = f
        .engine
        .update_recipe(
            recipe.id,
            RecipeUpdateCmd {
                name: Some("Broth".to_string()),
                ingredients: Some(vec![amount(f.flour, 5)]),
                tags: Some(vec![4242]),
                ..Default::default()
            },
            "alice",
        )
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("tags"));

    let current = f.engine.recipe(recipe.id, None).await.unwrap();
    assert_eq!(current, recipe);
}

#[tokio::test]
async fn update_swaps_image_file() {
    let f = fixture().await;
    let recipe = f
        .engine
        .create_recipe(create_cmd("Pie", vec![amount(f.flour, 1)], vec![]), "alice")
        .await
        .unwrap();

    let updated = f
        .engine
        .update_recipe(
            recipe.id,
            RecipeUpdateCmd {
                image: Some("data:image/gif;base64,R0lGODlh".to_string()),
                ..Default::default()
            },
            "alice",
        )
        .await
        .unwrap();

    assert!(updated.image.ends_with(".gif"));
    assert!(f.media.join(&updated.image).exists());
    assert!(!f.media.join(&recipe.image).exists());
}

#[tokio::test]
async fn only_author_can_modify() {
    let f = fixture().await;
    let recipe = f
        .engine
        .create_recipe(create_cmd("Stew", vec![amount(f.egg, 1)], vec![]), "alice")
        .await
        .unwrap();

    let err = f
        .engine
        .update_recipe(
            recipe.id,
            RecipeUpdateCmd {
                name: Some("Mine".to_string()),
                ..Default::default()
            },
            "bob",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = f.engine.delete_recipe(recipe.id, "bob").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = f.engine.delete_recipe(777, "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn delete_removes_recipe_markers_and_image() {
    let f = fixture().await;
    let recipe = f
        .engine
        .create_recipe(create_cmd("Salad", vec![amount(f.egg, 2)], vec![f.dinner]), "alice")
        .await
        .unwrap();
    f.engine.add_favorite(recipe.id, "bob").await.unwrap();
    f.engine.add_to_shopping_cart(recipe.id, "bob").await.unwrap();

    f.engine.delete_recipe(recipe.id, "alice").await.unwrap();

    let err = f.engine.recipe(recipe.id, None).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    assert!(f.engine.shopping_list("bob").await.unwrap().is_empty());
    assert!(!f.media.join(&recipe.image).exists());
}

#[tokio::test]
async fn favorites_are_idempotent() {
    let f = fixture().await;
    let recipe = f
        .engine
        .create_recipe(create_cmd("Omelette", vec![amount(f.egg, 3)], vec![]), "alice")
        .await
        .unwrap();

    let summary = f.engine.add_favorite(recipe.id, "bob").await.unwrap();
    assert_eq!(summary.name, "Omelette");
    f.engine.add_favorite(recipe.id, "bob").await.unwrap();

    assert!(f.engine.recipe(recipe.id, Some("bob")).await.unwrap().is_favorited);
    assert!(!f.engine.recipe(recipe.id, Some("alice")).await.unwrap().is_favorited);
    assert!(!f.engine.recipe(recipe.id, None).await.unwrap().is_favorited);

    f.engine.remove_favorite(recipe.id, "bob").await.unwrap();
    let err = f.engine.remove_favorite(recipe.id, "bob").await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = f.engine.add_favorite(999, "bob").await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn shopping_list_aggregates_by_name_and_unit() {
    let f = fixture().await;
    let first = f
        .engine
        .create_recipe(
            create_cmd("Pancakes", vec![amount(f.flour, 200), amount(f.egg, 2)], vec![]),
            "alice",
        )
        .await
        .unwrap();
    let second = f
        .engine
        .create_recipe(
            create_cmd("Cookies", vec![amount(f.flour, 300), amount(f.sugar, 50)], vec![]),
            "alice",
        )
        .await
        .unwrap();

    f.engine.add_to_shopping_cart(first.id, "bob").await.unwrap();
    f.engine.add_to_shopping_cart(second.id, "bob").await.unwrap();
    f.engine.add_to_shopping_cart(second.id, "bob").await.unwrap();

    let list = f.engine.shopping_list("bob").await.unwrap();
    let lines: Vec<String> = list.numbered_lines().collect();
    assert_eq!(
        lines,
        vec!["1. Egg - 2 pcs", "2. Flour - 500 g", "3. Sugar - 50 g"]
    );

    let pdf = list.to_pdf().unwrap();
    assert!(pdf.starts_with(b"%PDF-"));

    assert!(f.engine.shopping_list("alice").await.unwrap().is_empty());

    f.engine
        .remove_from_shopping_cart(first.id, "bob")
        .await
        .unwrap();
    let list = f.engine.shopping_list("bob").await.unwrap();
    assert_eq!(list.lines().len(), 2);
    assert_eq!(list.lines()[0].amount, 300);
}

#[tokio::test]
async fn shopping_list_keeps_units_of_one_name_apart() {
    let f = fixture().await;
    f.engine
        .import_ingredients(&[record("Flour", "kg"), record("Мука", "г")])
        .await
        .unwrap();
    let all = f.engine.search_ingredients(None).await.unwrap();
    let id_of = |name: &str, unit: &str| {
        all.iter()
            .find(|i| i.name == name && i.measurement_unit == unit)
            .map(|i| i.id)
            .unwrap()
    };
    let (flour_kg, muka) = (id_of("Flour", "kg"), id_of("Мука", "г"));

    let bread = f
        .engine
        .create_recipe(
            create_cmd("Bread", vec![amount(f.flour, 200), amount(flour_kg, 1)], vec![]),
            "alice",
        )
        .await
        .unwrap();
    let pie = f
        .engine
        .create_recipe(
            create_cmd("Pie", vec![amount(flour_kg, 2), amount(muka, 300)], vec![]),
            "bob",
        )
        .await
        .unwrap();
    f.engine.add_to_shopping_cart(bread.id, "bob").await.unwrap();
    f.engine.add_to_shopping_cart(pie.id, "bob").await.unwrap();

    let list = f.engine.shopping_list("bob").await.unwrap();
    let lines: Vec<String> = list.numbered_lines().collect();
    assert_eq!(
        lines,
        vec!["1. Flour - 200 g", "2. Flour - 3 kg", "3. Мука - 300 г"]
    );
    assert!(list.to_pdf().unwrap().starts_with(b"%PDF-"));
}

#[tokio::test]
async fn list_filters_and_pages() {
    let f = fixture().await;
    let mut ids = Vec::new();
    for i in 0..8 {
        let tags = if i % 2 == 0 { vec![f.breakfast] } else { vec![f.dinner] };
        let author = if i < 5 { "alice" } else { "bob" };
        let recipe = f
            .engine
            .create_recipe(
                create_cmd(&format!("Dish {i}"), vec![amount(f.flour, 10)], tags),
                author,
            )
            .await
            .unwrap();
        ids.push(recipe.id);
    }

    let page = f
        .engine
        .list_recipes(&RecipeListFilter::default(), None)
        .await
        .unwrap();
    assert_eq!(page.count, 8);
    assert_eq!(page.recipes.len(), 6);
    assert_eq!(page.recipes[0].id, ids[7]);
    assert_eq!(page.next_page(), Some(2));
    assert_eq!(page.previous_page(), None);

    let second = f
        .engine
        .list_recipes(
            &RecipeListFilter {
                page: 2,
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(second.recipes.len(), 2);
    assert_eq!(second.next_page(), None);
    assert_eq!(second.previous_page(), Some(1));

    let err = f
        .engine
        .list_recipes(
            &RecipeListFilter {
                page: 3,
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let dinner = f
        .engine
        .list_recipes(
            &RecipeListFilter {
                tags: vec!["dinner".to_string()],
                order: RecipeOrder::IdAsc,
                limit: 100,
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(
        dinner.recipes.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![ids[1], ids[3], ids[5], ids[7]]
    );

    let both_tags = f
        .engine
        .list_recipes(
            &RecipeListFilter {
                tags: vec!["dinner".to_string(), "breakfast".to_string()],
                limit: 100,
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(both_tags.count, 8);

    let by_bob = f
        .engine
        .list_recipes(
            &RecipeListFilter {
                author: Some("bob".to_string()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(by_bob.count, 3);

    f.engine.add_favorite(ids[0], "alice").await.unwrap();
    f.engine.add_to_shopping_cart(ids[1], "alice").await.unwrap();

    let favorited = f
        .engine
        .list_recipes(
            &RecipeListFilter {
                is_favorited: Some(true),
                ..Default::default()
            },
            Some("alice"),
        )
        .await
        .unwrap();
    assert_eq!(favorited.count, 1);
    assert!(favorited.recipes[0].is_favorited);

    let not_in_cart = f
        .engine
        .list_recipes(
            &RecipeListFilter {
                is_in_shopping_cart: Some(false),
                ..Default::default()
            },
            Some("alice"),
        )
        .await
        .unwrap();
    assert_eq!(not_in_cart.count, 7);

    let anonymous = f
        .engine
        .list_recipes(
            &RecipeListFilter {
                is_favorited: Some(true),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(anonymous.count, 8);
}

#[tokio::test]
async fn empty_list_first_page_is_ok() {
    let f = fixture().await;
    let page = f
        .engine
        .list_recipes(&RecipeListFilter::default(), None)
        .await
        .unwrap();
    assert_eq!(page.count, 0);
    assert!(page.recipes.is_empty());
    assert_eq!(page.next_page(), None);
}

#[tokio::test]
async fn ingredient_import_is_idempotent_and_search_uses_prefix() {
    let f = fixture().await;

    let json = r#"[
        {"name": "Crème fraîche", "measurement_unit": "g"},
        {"name": "Cream cheese", "measurement_unit": "g"},
        {"name": "Cream cheese", "measurement_unit": "g"},
        {"name": "Flour", "measurement_unit": "g"},
        {"name": "Flour", "measurement_unit": "kg"}
    ]"#;
    let report = f.engine.import_ingredients_json(json).await.unwrap();
    assert_eq!(report.created, 3);
    assert_eq!(report.skipped, 2);

    let report = f.engine.import_ingredients_json(json).await.unwrap();
    assert_eq!(report.created, 0);
    assert_eq!(report.skipped, 5);

    let found = f.engine.search_ingredients(Some("CRE")).await.unwrap();
    assert_eq!(
        found.iter().map(|i| i.name.as_str()).collect::<Vec<_>>(),
        vec!["Cream cheese", "Crème fraîche"]
    );

    let flour = f.engine.search_ingredients(Some("flo")).await.unwrap();
    assert_eq!(
        flour
            .iter()
            .map(|i| i.measurement_unit.as_str())
            .collect::<Vec<_>>(),
        vec!["g", "kg"]
    );

    assert!(f.engine.search_ingredients(Some("eggs")).await.unwrap().is_empty());
    assert!(f.engine.import_ingredients_json("{not json").await.is_err());
}

#[tokio::test]
async fn duplicate_tag_is_rejected() {
    let f = fixture().await;
    let err = f
        .engine
        .create_tag("Lunch", "#E26C2D", "lunch")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("#E26C2D".to_string()));

    let tags = f.engine.list_tags().await.unwrap();
    assert_eq!(tags.len(), 2);
    assert_eq!(f.engine.tag(tags[1].id).await.unwrap().slug, "dinner");
}
