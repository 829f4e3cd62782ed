mod common;

use pretty_assertions::assert_eq;
use scout_core::{Item, Platform, PLACEHOLDER_TITLE, UNKNOWN};
use scout_engine::{FieldExtractor, SiteProfile, Thresholds};
use scraper::{Html, Selector};

const TAOBAO_SEARCH: &str = "https://s.taobao.com/search?q=keyboard";

fn extract(
    platform: Platform,
    page_url: &str,
    markup: &str,
    card_css: &str,
) -> Vec<Option<Item>> {
    common::init_logging();
    let profile = SiteProfile::builtin(platform).compile().unwrap();
    let limits = Thresholds::default();
    let doc = Html::parse_document(markup);
    let selector = Selector::parse(card_css).unwrap();
    let extractor = FieldExtractor::new(&profile, &limits, platform, page_url);
    let items = doc
        .select(&selector)
        .enumerate()
        .map(|(index, card)| extractor.extract_card(card, index).unwrap())
        .collect();
    items
}

#[test]
fn jd_card_yields_every_field() {
    let markup = r#"<ul><li class="gl-item" data-sku="100012345">
        <div class="p-img"><a href="//item.jd.com/100012345.html?spm=1"><img src="a.jpg"></a></div>
        <div class="p-price"><strong><em>¥</em><i>129.90</i></strong></div>
        <div class="p-name"><a><em>罗技 M330 静音无线鼠标 办公</em></a></div>
        <span class="_goods_volume_1xkku_1"><span title="已售5万+">已售5万+</span></span>
        <div class="p-shop"><span><a>罗技京东自营旗舰店</a></span></div>
        <span class="_tml_1xkku_12" title="98%好评">98%好评</span>
    </li></ul>"#;
    let items = extract(Platform::Jd, common::JD_SEARCH, markup, "li.gl-item");

    let expected = Item::new(
        "罗技 M330 静音无线鼠标 办公",
        "129.90",
        "https://item.jd.com/100012345.html",
    )
    .with_shop("罗技京东自营旗舰店")
    .with_engagement("5万+", "98%");
    assert_eq!(items, vec![Some(expected)]);
}

#[test]
fn taobao_card_splits_price_and_keeps_the_query_link() {
    let markup = r#"<div><a class="doubleCardWrapperAdapt--mEcC7olq" href="//item.taobao.com/item.htm?id=7788&amp;spm=a21n57">
        <div class="title--qJ7Xg_90"><span>2024新款 机械键盘 青轴 热插拔</span></div>
        <div class="priceWrapper--dBtPZ2K1"><span class="unit--">¥</span><span class="priceInt--yqqZMJ5a">89</span><span class="priceFloat--XpixvyQ1">.50</span></div>
        <div class="shopName--DmtlsDKm">极客外设店</div>
    </a></div>"#;
    let items = extract(
        Platform::Taobao,
        TAOBAO_SEARCH,
        markup,
        r#"a[class*="doubleCardWrapperAdapt--"]"#,
    );

    let expected = Item::new(
        "2024新款 机械键盘 青轴 热插拔",
        "89.50",
        "https://item.taobao.com/item.htm?id=7788&spm=a21n57",
    )
    .with_shop("极客外设店");
    assert_eq!(items, vec![Some(expected)]);
}

#[test]
fn link_without_title_is_kept_with_placeholder() {
    let markup = r#"<ul><li class="gl-item">
        <a href="//item.jd.com/100200.html"><img src="x.jpg"></a>
    </li></ul>"#;
    let items = extract(Platform::Jd, common::JD_SEARCH, markup, "li.gl-item");

    let item = items[0].clone().expect("card with a link is included");
    assert_eq!(item.title, PLACEHOLDER_TITLE);
    assert_eq!(item.price, UNKNOWN);
    assert_eq!(item.shop, UNKNOWN);
    assert_eq!(item.link, "https://item.jd.com/100200.html");
    assert_eq!(item.sales.as_deref(), Some(UNKNOWN));
    assert_eq!(item.rating.as_deref(), Some(UNKNOWN));
}

#[test]
fn card_without_title_link_or_id_is_rejected() {
    let markup = r#"<ul><li class="gl-item"><span>广告</span></li></ul>"#;
    let items = extract(Platform::Jd, common::JD_SEARCH, markup, "li.gl-item");
    assert_eq!(items, vec![None]);
}

#[test]
fn numeric_id_attribute_becomes_a_detail_link() {
    let markup = r#"<ul><li class="gl-item" data-sku="5566">
        <div class="p-name"><em>某品牌 蓝牙耳机 主动降噪</em></div>
    </li></ul>"#;
    let items = extract(Platform::Jd, common::JD_SEARCH, markup, "li.gl-item");
    let item = items[0].clone().unwrap();
    assert_eq!(item.title, "某品牌 蓝牙耳机 主动降噪");
    assert_eq!(item.link, "https://item.jd.com/5566.html");
}

#[test]
fn title_falls_back_to_the_first_meaningful_text_line() {
    let markup = r#"<section>
      <div class="card">
        <div>¥59.00</div>
        <div>已售1000+件</div>
        <div>华为 Mate 手机壳 防摔</div>
        <a href="https://item.taobao.com/item.htm?id=42">go</a>
      </div>
    </section>"#;
    let items = extract(Platform::Taobao, TAOBAO_SEARCH, markup, "div.card");
    let item = items[0].clone().unwrap();
    assert_eq!(item.title, "华为 Mate 手机壳 防摔");
    assert_eq!(item.price, "59.00");
    assert_eq!(item.link, "https://item.taobao.com/item.htm?id=42");
}

#[test]
fn coupon_amounts_are_not_read_as_the_price() {
    let markup = r#"<section>
      <div class="card">
        <div>满300减¥20</div>
        <div>¥129</div>
        <div>便携式 咖啡 研磨机</div>
        <a href="https://item.taobao.com/item.htm?id=43">go</a>
      </div>
    </section>"#;
    let items = extract(Platform::Taobao, TAOBAO_SEARCH, markup, "div.card");
    assert_eq!(items[0].clone().unwrap().price, "129");
}

#[test]
fn title_without_link_gets_a_search_link() {
    let markup = r#"<section>
      <div class="card"><div class="title--abc">无线充电器 快充 15W 立式</div></div>
    </section>"#;
    let items = extract(Platform::Taobao, TAOBAO_SEARCH, markup, "div.card");
    let link = items[0].clone().unwrap().link;
    assert!(link.starts_with("https://s.taobao.com/search?q="), "{link}");
}

#[test]
fn page_signature_is_the_first_card_id() {
    common::init_logging();
    let markup = common::jd_results(
        &[
            common::jd_card(1001, "无线鼠标 静音 办公", "59.00"),
            common::jd_card(1002, "机械键盘 青轴 87键", "199.00"),
        ],
        "",
    );
    let profile = SiteProfile::jd().compile().unwrap();
    let limits = Thresholds::default();
    let doc = Html::parse_document(&markup);
    let selector = Selector::parse("li.gl-item").unwrap();
    let cards: Vec<_> = doc.select(&selector).collect();

    let page = FieldExtractor::new(&profile, &limits, Platform::Jd, common::JD_SEARCH)
        .extract_page(&cards);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.signature.as_deref(), Some("1001"));
    assert_eq!(page.rejected, 0);
    assert_eq!(page.failed, 0);
    assert_eq!(page.items[1].shop, "机械键盘 青轴 87键 旗舰店");
}

#[test]
fn leading_card_without_an_id_leaves_the_page_unsigned() {
    common::init_logging();
    let markup = common::jd_results(
        &[
            r#"<li class="gl-item"><span>广告</span></li>"#.to_string(),
            common::jd_card(2001, "蓝牙音箱 便携 防水", "139.00"),
        ],
        "",
    );
    let profile = SiteProfile::jd().compile().unwrap();
    let limits = Thresholds::default();
    let doc = Html::parse_document(&markup);
    let selector = Selector::parse("li.gl-item").unwrap();
    let cards: Vec<_> = doc.select(&selector).collect();
    let extractor = FieldExtractor::new(&profile, &limits, Platform::Jd, common::JD_SEARCH);

    let page = extractor.extract_page(&cards);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.rejected, 1);
    assert_eq!(page.signature, None);
    assert_eq!(extractor.card_id(cards[1]).as_deref(), Some("2001"));
}
