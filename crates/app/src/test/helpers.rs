//! Test Helpers

use crate::{
    domain::{
        categories::{
            CategoriesService, CategoriesServiceError,
            data::NewCategory,
            records::{CategoryRecord, CategoryUuid},
        },
        products::{
            ProductsService, ProductsServiceError,
            data::NewProduct,
            records::{ProductRecord, ProductUuid},
        },
        users::{
            UsersService, UsersServiceError,
            data::NewUser,
            records::{UserRecord, UserUuid},
        },
    },
    test::TestContext,
};

pub(crate) async fn create_category(
    ctx: &TestContext,
    slug: &str,
) -> Result<CategoryRecord, CategoriesServiceError> {
    ctx.categories
        .create_category(NewCategory {
            uuid: CategoryUuid::new(),
            name: slug.to_uppercase(),
            slug: slug.to_string(),
        })
        .await
}

pub(crate) async fn create_product(
    ctx: &TestContext,
    category: CategoryUuid,
    name: &str,
    price: u64,
    stock: u64,
) -> Result<ProductRecord, ProductsServiceError> {
    ctx.products
        .create_product(NewProduct {
            uuid: ProductUuid::new(),
            category_uuid: category,
            name: name.to_string(),
            brand: "Stride".to_string(),
            price,
            stock,
            sizes: vec!["42".to_string(), "43".to_string()],
        })
        .await
}

pub(crate) async fn create_user(
    ctx: &TestContext,
    email: &str,
) -> Result<UserRecord, UsersServiceError> {
    ctx.users
        .create_user(NewUser {
            uuid: UserUuid::new(),
            email: email.to_string(),
        })
        .await
}
