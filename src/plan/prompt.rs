use super::dto::DayPlanRequest;

/// Builds the single-day instruction sent to the model.
pub fn build_day_prompt(req: &DayPlanRequest) -> String {
    let p = &req.profile;
    let variation = if req.alternative_index > 1 {
        "Crie variações de alimentos diferentes da Alternativa 1, mantendo as metas nutricionais."
    } else {
        "Este é o plano principal."
    };
    let day_prefix: String = req.day_name.chars().take(3).collect();

    format!(
        r#"
Você é um assistente de nutrição avançado. Sua tarefa é criar um ÚNICO plano alimentar diário em formato JSON puro, baseado nos dados do usuário para um dia e alternativa específicos.

**Dados do Usuário:**
- Idade: {age}, Sexo: {gender}
- Altura: {height} cm, Peso Atual: {weight} kg, Meta de Peso: {goal_weight} kg
- Objetivo: {objective}, Nível de Atividade: {level}
- Modelo de Dieta: {diet_model}
- Estilo de Dieta (Preferência): {diet_style}
- Orçamento: {budget}
- Restrições: {restrictions}
- Condições Médicas: {conditions}
- Medicamentos: {medications}

**Tarefa Específica:**
- Gere o plano para o dia: {day}
- Esta é a Alternativa: {alt}
- {variation}

**Instruções OBRIGATÓRIAS para o JSON:**
1.  Retorne APENAS o objeto JSON do plano diário, NADA MAIS, sem markdown (```).
2.  Use a seguinte estrutura EXATA:
    {{
      "resumo": {{
        "caloriasTotais": 2000,
        "proteinasTotais": 150,
        "carboidratosTotais": 200,
        "lipidiosTotais": 50,
        "metaAgua": 2500,
        "objetivoPrincipal": "{objective}"
      }},
      "refeicoes": [
        {{
          "id": "{day_prefix}-{alt}-1",
          "nome": "Café da Manhã",
          "horario": "08:00",
          "categoria": "Café da Manhã",
          "calorias": 350,
          "proteinas": 20,
          "carboidratos": 40,
          "lipidios": 15,
          "ingredientes": [{{"texto": "Ovo mexido (2 unidades)"}}, {{"texto": "Pão integral (1 fatia)"}}],
          "tempoPreparo": "10-15 minutos",
          "modoPreparo": ["Bata os ovos.", "Cozinhe em fogo baixo."],
          "completed": false
        }}
      ]
    }}
3.  Calcule valores realistas para os totais do resumo.
4.  Inclua as outras refeições do dia (Almoço, Lanche, Jantar) com todos os campos preenchidos.
5.  Os campos "id" das refeições devem ser únicos e seguir o padrão "{day_prefix}-{alt}-<número>".
"#,
        age = p.age,
        gender = p.gender,
        height = p.height,
        weight = p.weight,
        goal_weight = p.goal_weight,
        objective = p.objective,
        level = p.level,
        diet_model = p.diet_model,
        diet_style = p.diet_style,
        budget = p.budget,
        restrictions = p.restrictions,
        conditions = p.medical_conditions,
        medications = p.medications,
        day = req.day_name,
        alt = req.alternative_index,
        variation = variation,
        day_prefix = day_prefix,
    )
}
