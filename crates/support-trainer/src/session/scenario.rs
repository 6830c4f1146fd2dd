use rand::Rng;
use serde::Serialize;

/// Role-play setup for one simulation: who the customer is and how they behave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioDefinition {
    pub name: &'static str,
    pub title: &'static str,
    pub system_instruction: &'static str,
    pub opening_message: &'static str,
}

const CUSTOMER_RULES: &str = "Отвечай только от лица клиента, коротко (1-3 предложения), \
без пояснений и без ролевых пометок.";

const DAMAGED_PRODUCT: ScenarioDefinition = ScenarioDefinition {
    name: "damaged_product",
    title: "Жалоба на товар",
    system_instruction: "Ты клиент интернет-магазина оптики. Ты получил оптический прицел с \
треснувшей линзой и раздражён. Сначала требуешь объяснений и говоришь резко. Если сотрудник \
извиняется и предлагает конкретное решение (замену или возврат), постепенно успокаиваешься \
и соглашаешься. Если сотрудник перекладывает вину на тебя, злишься сильнее.",
    opening_message: "Здравствуйте! Я получил прицел, а линза треснута. Как вообще можно \
отправлять такой товар?!",
};

const DELAYED_DELIVERY: ScenarioDefinition = ScenarioDefinition {
    name: "delayed_delivery",
    title: "Вопрос по доставке",
    system_instruction: "Ты клиент интернет-магазина оптики. Твой заказ (бинокль) должен был \
прийти неделю назад, но статус не меняется. Ты вежлив, но обеспокоен и хочешь точные сроки. \
Если сотрудник уточняет номер заказа и называет понятные сроки, ты благодаришь. Если ответы \
расплывчатые, настаиваешь и спрашиваешь о компенсации.",
    opening_message: "Добрый день. Мой заказ должен был прийти неделю назад, а статус не \
меняется. Где он?",
};

const REFUND_REQUEST: ScenarioDefinition = ScenarioDefinition {
    name: "refund_request",
    title: "Возврат средств",
    system_instruction: "Ты клиент интернет-магазина оптики. Ты купил монокуляр, но он тебе не \
подошёл, и ты хочешь вернуть деньги. Ты не знаешь порядок возврата и немного растерян. Если \
сотрудник по шагам объясняет процедуру возврата, ты доволен. Если сотрудник отказывает без \
объяснений, требуешь руководителя.",
    opening_message: "Здравствуйте, хочу вернуть монокуляр и получить деньги обратно. Как это \
сделать?",
};

/// Fixed set of scenarios a simulation is drawn from.
#[derive(Debug, Clone)]
pub struct ScenarioCatalog {
    scenarios: Vec<ScenarioDefinition>,
}

impl ScenarioCatalog {
    pub fn standard() -> Self {
        Self {
            scenarios: vec![DAMAGED_PRODUCT, DELAYED_DELIVERY, REFUND_REQUEST],
        }
    }

    pub fn scenarios(&self) -> &[ScenarioDefinition] {
        &self.scenarios
    }

    pub fn get(&self, name: &str) -> Option<&ScenarioDefinition> {
        let wanted = name.trim();
        self.scenarios
            .iter()
            .find(|scenario| scenario.name.eq_ignore_ascii_case(wanted))
    }

    /// Uniform random pick.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&ScenarioDefinition> {
        if self.scenarios.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.scenarios.len());
        self.scenarios.get(index)
    }
}

impl Default for ScenarioCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl ScenarioDefinition {
    /// Persona instruction sent as the system message of every completion request.
    pub fn persona_prompt(&self) -> String {
        format!("{} {}", self.system_instruction, CUSTOMER_RULES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn standard_catalog_has_three_distinct_scenarios() {
        let catalog = ScenarioCatalog::standard();
        let names: HashSet<_> = catalog.scenarios().iter().map(|s| s.name).collect();
        assert_eq!(names.len(), 3);
        assert!(catalog
            .scenarios()
            .iter()
            .all(|scenario| !scenario.opening_message.is_empty()));
    }

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        let catalog = ScenarioCatalog::standard();
        let scenario = catalog.get(" Refund_Request ").expect("scenario found");
        assert_eq!(scenario.title, "Возврат средств");
        assert!(catalog.get("unknown").is_none());
    }

    #[test]
    fn choose_reaches_every_scenario() {
        let catalog = ScenarioCatalog::standard();
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let scenario = catalog.choose(&mut rng).expect("non-empty catalog");
            seen.insert(scenario.name);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn persona_prompt_appends_reply_rules() {
        let prompt = DAMAGED_PRODUCT.persona_prompt();
        assert!(prompt.starts_with(DAMAGED_PRODUCT.system_instruction));
        assert!(prompt.ends_with(CUSTOMER_RULES));
    }
}
