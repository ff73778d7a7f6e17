//! Built-in starter catalog.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::Product;

// (name, description, price in paisa, image, category, brand, stock, featured, rating, reviews)
type CatalogRow = (&'static str, &'static str, i64, &'static str, &'static str, &'static str, u32, bool, f64, u32);

const CATALOG: [CatalogRow; 12] = [
    (
        "Luxury Matte Lipstick Set",
        "Twelve long-wear matte shades with vitamin E.",
        249999,
        "/static/products/matte-lipstick-set.jpg",
        "Cosmetics",
        "GlamourPro",
        25,
        true,
        4.8,
        324,
    ),
    (
        "Professional Makeup Brush Set",
        "24-piece synthetic brush set for face, eyes and lips.",
        189999,
        "/static/products/makeup-brush-set.jpg",
        "Cosmetics",
        "BeautyTools",
        15,
        true,
        4.9,
        189,
    ),
    (
        "Radiant Foundation Palette",
        "Eight full-coverage foundation tones in one palette.",
        329999,
        "/static/products/foundation-palette.jpg",
        "Cosmetics",
        "PerfectTone",
        8,
        false,
        4.7,
        156,
    ),
    (
        "Shimmer Eyeshadow Collection",
        "36 metallic and shimmer eyeshadow colors.",
        159999,
        "/static/products/eyeshadow-collection.jpg",
        "Cosmetics",
        "ColorMagic",
        12,
        false,
        4.6,
        89,
    ),
    (
        "Waterproof Mascara Duo",
        "Volumizing and lengthening waterproof mascaras.",
        89999,
        "/static/products/mascara-duo.jpg",
        "Cosmetics",
        "LashPerfect",
        30,
        true,
        4.5,
        203,
    ),
    (
        "Contouring Kit Pro",
        "Six-shade contour and highlight kit with brushes.",
        219999,
        "/static/products/contouring-kit.jpg",
        "Cosmetics",
        "SculptFace",
        18,
        false,
        4.4,
        134,
    ),
    (
        "Elegant Evening Gown",
        "Floor-length evening gown for formal occasions.",
        899999,
        "/static/products/evening-gown.jpg",
        "Fancy Dress",
        "ElegantWear",
        5,
        true,
        4.9,
        67,
    ),
    (
        "Designer Cocktail Dress",
        "Tailored knee-length cocktail dress.",
        459999,
        "/static/products/cocktail-dress.jpg",
        "Fancy Dress",
        "ChicStyle",
        12,
        false,
        4.7,
        78,
    ),
    (
        "Vintage Inspired Dress",
        "Retro silhouette with modern fabric.",
        329999,
        "/static/products/vintage-dress.jpg",
        "Fancy Dress",
        "VintageCharm",
        8,
        false,
        4.6,
        45,
    ),
    (
        "Formal Business Suit",
        "Two-piece suit for the office and events.",
        679999,
        "/static/products/business-suit.jpg",
        "Fancy Dress",
        "PowerSuit",
        15,
        false,
        4.8,
        92,
    ),
    (
        "Party Sequin Dress",
        "Sequined dress cut for evenings out.",
        389999,
        "/static/products/sequin-dress.jpg",
        "Fancy Dress",
        "GlamourNight",
        10,
        true,
        4.5,
        156,
    ),
    (
        "Traditional Ethnic Wear",
        "Hand-finished traditional outfit.",
        549999,
        "/static/products/ethnic-wear.jpg",
        "Fancy Dress",
        "Heritage",
        7,
        false,
        4.9,
        234,
    ),
];

pub fn default_products() -> Vec<Product> {
    CATALOG
        .iter()
        .map(
            |&(name, description, paisa, image, category, brand, stock, featured, rating, reviews)| {
                Product {
                    id: Uuid::new_v4(),
                    name: name.to_string(),
                    description: description.to_string(),
                    price: Decimal::new(paisa, 2),
                    image: image.to_string(),
                    category: category.to_string(),
                    brand: brand.to_string(),
                    stock,
                    featured,
                    rating,
                    review_count: reviews,
                }
            },
        )
        .collect()
}
