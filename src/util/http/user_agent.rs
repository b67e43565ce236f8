use rand::Rng;

const CHROME_VERSIONS: [&str; 8] = [
    "133.0.6943.98",
    "132.0.6834.110",
    "131.0.6778.108",
    "130.0.6723.117",
    "129.0.6668.89",
    "128.0.6613.138",
    "127.0.6533.119",
    "126.0.6478.182",
];

const FIREFOX_VERSIONS: [&str; 6] = ["133.0", "132.0", "131.0", "130.0", "129.0", "128.0"];

const OS_STRINGS: [&str; 5] = [
    "Windows NT 10.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "Macintosh; Intel Mac OS X 14_7_1",
    "X11; Linux x86_64",
    "X11; Ubuntu; Linux x86_64",
];

/// 隨機產生桌面瀏覽器的 User-Agent，降低被公開資訊觀測站阻擋的機率
pub fn gen_random_ua() -> String {
    let mut rng = rand::rng();
    let os = OS_STRINGS[rng.random_range(0..OS_STRINGS.len())];

    if rng.random_bool(0.5) {
        let version = CHROME_VERSIONS[rng.random_range(0..CHROME_VERSIONS.len())];
        format!(
            "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36",
            os, version
        )
    } else {
        let version = FIREFOX_VERSIONS[rng.random_range(0..FIREFOX_VERSIONS.len())];
        format!(
            "Mozilla/5.0 ({}; rv:{}) Gecko/20100101 Firefox/{}",
            os, version, version
        )
    }
}
